use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

use crate::Error;
use crate::Evr;

/// The comparison sense of a versioned dependency
///
/// A sense of [`DependencySense::None`] means the dependency matches any
/// version of the named capability.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::DependencySense;
///
/// assert_eq!(DependencySense::from_str(">="), Ok(DependencySense::Ge));
/// assert_eq!(">=", format!("{}", DependencySense::Ge));
/// ```
#[derive(Clone, Copy, Debug, EnumIter, Eq, PartialEq)]
#[non_exhaustive]
pub enum DependencySense {
    /// Less than or equal to (`<=`)
    Le,
    /// Greater than or equal to (`>=`)
    Ge,
    /// Equal to (`=`)
    Eq,
    /// Less than (`<`)
    Lt,
    /// Greater than (`>`)
    Gt,
    /// No version constraint
    None,
}

impl DependencySense {
    /// Return the operator form of the sense, or `None` for an
    /// unconstrained sense
    ///
    /// NOTE: the variant declaration (and thus iteration) order puts the
    /// two-character operators before the one-character ones, which the
    /// embedded-operator split in [`Dependency::from_str`] relies on!
    pub fn as_operator(&self) -> Option<&'static str> {
        match self {
            DependencySense::Le => Some("<="),
            DependencySense::Ge => Some(">="),
            DependencySense::Eq => Some("="),
            DependencySense::Lt => Some("<"),
            DependencySense::Gt => Some(">"),
            DependencySense::None => None,
        }
    }

    /// Create a DependencySense from a metadata-database flags column
    ///
    /// The dependency tables store the sense as `EQ`, `LT`, `LE`, `GT` or
    /// `GE`; a NULL column means the dependency is unversioned.
    pub fn from_flags(flags: Option<&str>) -> Result<Self, Error> {
        match flags {
            None | Some("") => Ok(DependencySense::None),
            Some("EQ") => Ok(DependencySense::Eq),
            Some("LT") => Ok(DependencySense::Lt),
            Some("LE") => Ok(DependencySense::Le),
            Some("GT") => Ok(DependencySense::Gt),
            Some("GE") => Ok(DependencySense::Ge),
            Some(other) => Err(Error::InvalidSense(other.to_string())),
        }
    }

    /// Return the metadata-database flags form of the sense
    pub fn as_flags(&self) -> Option<&'static str> {
        match self {
            DependencySense::Eq => Some("EQ"),
            DependencySense::Lt => Some("LT"),
            DependencySense::Le => Some("LE"),
            DependencySense::Gt => Some("GT"),
            DependencySense::Ge => Some("GE"),
            DependencySense::None => None,
        }
    }

    /// Returns `true` if a comparison result between a provided and a
    /// required version satisfies this sense
    fn is_compatible_with(self, ord: Ordering) -> bool {
        match (self, ord) {
            (DependencySense::None, _)
            | (DependencySense::Lt, Ordering::Less)
            | (DependencySense::Le, Ordering::Less | Ordering::Equal)
            | (DependencySense::Eq, Ordering::Equal)
            | (DependencySense::Ge, Ordering::Greater | Ordering::Equal)
            | (DependencySense::Gt, Ordering::Greater) => true,

            (DependencySense::Lt, Ordering::Equal | Ordering::Greater)
            | (DependencySense::Le, Ordering::Greater)
            | (DependencySense::Eq, Ordering::Less | Ordering::Greater)
            | (DependencySense::Ge, Ordering::Less)
            | (DependencySense::Gt, Ordering::Less | Ordering::Equal) => false,
        }
    }
}

impl FromStr for DependencySense {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(DependencySense::Lt),
            "<=" => Ok(DependencySense::Le),
            "=" => Ok(DependencySense::Eq),
            ">=" => Ok(DependencySense::Ge),
            ">" => Ok(DependencySense::Gt),
            _ => Err(Error::InvalidSense(s.to_string())),
        }
    }
}

impl Display for DependencySense {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.as_operator().unwrap_or(""))
    }
}

/// A package dependency
///
/// Describes a relation to a capability: either a bare capability name, or
/// a name constrained by a [`DependencySense`] and an [`Evr`]. A
/// dependency whose name starts with `/` is a file requirement and is
/// additionally satisfiable by a package's file list.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::{Dependency, DependencySense};
///
/// let dep = Dependency::from_str("glibc >= 2.11")?;
/// assert_eq!("glibc", dep.name);
/// assert_eq!(DependencySense::Ge, dep.sense);
///
/// // embedded operators and bare names also parse
/// assert_eq!(dep, Dependency::from_str("glibc>=2.11")?);
/// assert!(Dependency::from_str("libc.so.6")?.evr.is_none());
/// assert!(Dependency::from_str("/usr/bin/env")?.is_file());
/// # Ok::<(), ryum_types::Error>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dependency {
    /// The capability name
    pub name: String,
    /// The comparison sense qualifying `evr`
    pub sense: DependencySense,
    /// The version constraint; `None` when `sense` is
    /// [`DependencySense::None`]
    pub evr: Option<Evr>,
}

impl Dependency {
    /// Create a new Dependency
    pub fn new(name: String, sense: DependencySense, evr: Option<Evr>) -> Self {
        Dependency { name, sense, evr }
    }

    /// Create a Dependency matching any version of `name`
    pub fn unversioned(name: &str) -> Self {
        Dependency {
            name: name.to_string(),
            sense: DependencySense::None,
            evr: None,
        }
    }

    /// Returns `true` if this dependency is a file requirement
    pub fn is_file(&self) -> bool {
        self.name.starts_with('/')
    }

    /// Returns `true` if the `provided` capability satisfies this
    /// requirement
    ///
    /// Names must match exactly. An unconstrained requirement is
    /// satisfied by any provide of its name. A constrained requirement is
    /// satisfied by an unconstrained provide, or by an `=`-constrained
    /// provide whose version compares against the required version in the
    /// required sense. Provides with any other sense never satisfy.
    ///
    /// ## Examples
    /// ```
    /// use std::str::FromStr;
    /// use ryum_types::Dependency;
    ///
    /// let required = Dependency::from_str("foo >= 2.0")?;
    /// assert!(required.satisfies(&Dependency::from_str("foo = 2.5")?));
    /// assert!(required.satisfies(&Dependency::from_str("foo")?));
    /// assert!(!required.satisfies(&Dependency::from_str("foo = 1.0")?));
    /// assert!(!required.satisfies(&Dependency::from_str("bar = 2.5")?));
    /// # Ok::<(), ryum_types::Error>(())
    /// ```
    pub fn satisfies(&self, provided: &Dependency) -> bool {
        if self.name != provided.name {
            return false;
        }

        let (Some(required_evr), true) = (&self.evr, self.sense != DependencySense::None) else {
            return true;
        };

        match (provided.sense, &provided.evr) {
            (DependencySense::None, _) => true,
            (DependencySense::Eq, Some(provided_evr)) => self
                .sense
                .is_compatible_with(provided_evr.compare(required_evr)),
            (_, _) => false,
        }
    }
}

impl FromStr for Dependency {
    type Err = Error;

    /// Parse a Dependency from a string slice
    ///
    /// Accepts a bare capability name, the whitespace-separated
    /// `name SENSE evr` form, and the embedded `name>=evr` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, the sense operator is
    /// unknown, or the version fails to parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();

        match tokens[..] {
            [name, sense, evr] => Ok(Dependency {
                name: name.to_string(),
                sense: sense.parse()?,
                evr: Some(evr.parse()?),
            }),
            [token] => {
                for sense in DependencySense::iter() {
                    let Some(operator) = sense.as_operator() else {
                        continue;
                    };
                    if let Some((name, evr)) = token.split_once(operator) {
                        if name.is_empty() {
                            return Err(Error::InvalidDependency(s.to_string()));
                        }
                        return Ok(Dependency {
                            name: name.to_string(),
                            sense,
                            evr: Some(evr.parse()?),
                        });
                    }
                }

                Ok(Dependency::unversioned(token))
            }
            _ => Err(Error::InvalidDependency(s.to_string())),
        }
    }
}

impl Display for Dependency {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        match &self.evr {
            Some(evr) => write!(fmt, "{} {} {}", self.name, self.sense, evr),
            None => write!(fmt, "{}", self.name),
        }
    }
}

impl Serialize for Dependency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("glibc", "glibc", DependencySense::None, None)]
    #[case("glibc >= 2.11", "glibc", DependencySense::Ge, Some("2.11"))]
    #[case("glibc>=2.11", "glibc", DependencySense::Ge, Some("2.11"))]
    #[case("foo = 1:2.0-1", "foo", DependencySense::Eq, Some("1:2.0-1"))]
    #[case("foo<2", "foo", DependencySense::Lt, Some("2"))]
    #[case("foo<=2", "foo", DependencySense::Le, Some("2"))]
    #[case("foo>2", "foo", DependencySense::Gt, Some("2"))]
    #[case("  bar  <  3.0  ", "bar", DependencySense::Lt, Some("3.0"))]
    #[case("/usr/bin/env", "/usr/bin/env", DependencySense::None, None)]
    #[case("libc.so.6(GLIBC_2.4)(64bit)", "libc.so.6(GLIBC_2.4)(64bit)", DependencySense::None, None)]
    fn dependency_from_str(
        #[case] input: &str,
        #[case] name: &str,
        #[case] sense: DependencySense,
        #[case] evr: Option<&str>,
    ) {
        let dep = Dependency::from_str(input).unwrap();
        assert_eq!(name, dep.name);
        assert_eq!(sense, dep.sense);
        assert_eq!(evr.map(|e| Evr::from_str(e).unwrap()), dep.evr);
    }

    #[rstest]
    #[case("")]
    #[case("foo bar")]
    #[case("foo ~ 1.0")]
    #[case("foo = 1.0 extra")]
    #[case(">=2.11")]
    fn dependency_from_str_invalid(#[case] input: &str) {
        assert!(Dependency::from_str(input).is_err());
    }

    #[rstest]
    #[case("glibc", "glibc")]
    #[case("glibc >= 2.11", "glibc >= 2.11")]
    #[case("glibc>=2.11", "glibc >= 2.11")]
    #[case("foo = 1:2.0-1", "foo = 1:2.0-1")]
    fn dependency_to_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            expected,
            format!("{}", Dependency::from_str(input).unwrap())
        );
    }

    #[rstest]
    // unconstrained requirement matches any provide of the name
    #[case("foo", "foo", true)]
    #[case("foo", "foo = 1.0", true)]
    #[case("foo", "bar", false)]
    // unconstrained provide matches any requirement of the name
    #[case("foo >= 2.0", "foo", true)]
    // EQ provides compare in the required sense
    #[case("foo >= 2.0", "foo = 2.0", true)]
    #[case("foo >= 2.0", "foo = 2.5", true)]
    #[case("foo >= 2.0", "foo = 1.0", false)]
    #[case("foo < 2.0", "foo = 1.0", true)]
    #[case("foo < 2.0", "foo = 2.0", false)]
    #[case("foo <= 2.0", "foo = 2.0", true)]
    #[case("foo > 2.0", "foo = 2.0", false)]
    #[case("foo > 2.0", "foo = 1:1.0", true)]
    #[case("foo = 2.0", "foo = 2.0", true)]
    #[case("foo = 2.0", "foo = 2.0-1", true)]
    // provides constrained by anything but EQ never satisfy
    #[case("foo >= 2.0", "foo >= 1.0", false)]
    fn dependency_satisfies(#[case] required: &str, #[case] provided: &str, #[case] ok: bool) {
        let required = Dependency::from_str(required).unwrap();
        let provided = Dependency::from_str(provided).unwrap();
        assert_eq!(ok, required.satisfies(&provided));
    }

    #[rstest]
    #[case(None, Ok(DependencySense::None))]
    #[case(Some("EQ"), Ok(DependencySense::Eq))]
    #[case(Some("LT"), Ok(DependencySense::Lt))]
    #[case(Some("LE"), Ok(DependencySense::Le))]
    #[case(Some("GT"), Ok(DependencySense::Gt))]
    #[case(Some("GE"), Ok(DependencySense::Ge))]
    #[case(Some("XX"), Err(Error::InvalidSense("XX".to_string())))]
    fn sense_from_flags(
        #[case] flags: Option<&str>,
        #[case] expected: Result<DependencySense, Error>,
    ) {
        assert_eq!(expected, DependencySense::from_flags(flags));
    }

    #[test]
    fn sense_flags_round_trip() {
        for sense in DependencySense::iter() {
            assert_eq!(
                Ok(sense),
                DependencySense::from_flags(sense.as_flags()),
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn dependency_round_trip(s in r"[a-z][a-z0-9._+-]{0,20}( (<|<=|=|>=|>) ([1-9]:)?[0-9a-z][0-9a-z.]{0,8}(-[0-9a-z][0-9a-z.]{0,4})?)?") {
            let dep = Dependency::from_str(&s).unwrap();
            prop_assert_eq!(s, format!("{}", dep));
        }
    }
}
