// SPDX-FileCopyrightText: 2026 ryum contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// An epoch of a package version
///
/// The epoch is prepended to a version, delimited by a `":"` (e.g. `1:` is
/// added to `2.11-1` to form `1:2.11-1`, which orders newer than any
/// unepoched `2.x` version). A version without an epoch compares as epoch
/// `0`.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::Epoch;
///
/// assert!(Epoch::from_str("0").is_ok());
/// assert!(Epoch::from_str("1").is_ok());
/// assert!(Epoch::from_str("-1").is_err());
/// assert!(Epoch::from_str("one").is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Epoch(u64);

impl Epoch {
    /// Create a new Epoch from a string and return it in a Result
    pub fn new(epoch: &str) -> Result<Self, Error> {
        match epoch.parse() {
            Ok(epoch) => Ok(Epoch(epoch)),
            Err(_) => Err(Error::InvalidEpoch(epoch.to_string())),
        }
    }

    /// Return the inner value
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Epoch {
    fn from(epoch: u64) -> Self {
        Epoch(epoch)
    }
}

impl FromStr for Epoch {
    type Err = Error;
    /// Create an Epoch from a string and return it in a Result
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Epoch::new(input)
    }
}

impl Display for Epoch {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.inner())
    }
}

/// An epoch-version-release triple
///
/// An `Evr` tracks an optional [`Epoch`], a version and an optional
/// release. It is parsed from strings of the shape `[epoch:]version[-release]`.
///
/// Comparison follows the rpm rules: epochs are compared numerically (an
/// absent epoch counts as `0`), then version and release are compared with
/// the rpm segment comparator (see [`Evr::compare`]). An absent release
/// compares equal to any release.
///
/// The comparison semantics carry over to `Eq`/`Ord`: `1.0` and `0:1.0`
/// are equal, as are `1.0-1` and `1.0`.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::Evr;
///
/// let evr = Evr::from_str("1:2.11-1.fc12")?;
/// assert_eq!(evr.epoch().map(|e| e.inner()), Some(1));
/// assert_eq!(evr.version(), "2.11");
/// assert_eq!(evr.release(), Some("1.fc12"));
///
/// assert!(Evr::from_str("1.0~rc1")? < Evr::from_str("1.0")?);
/// assert!(Evr::from_str("1:0.5")? > Evr::from_str("2.0")?);
/// # Ok::<(), ryum_types::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Evr {
    epoch: Option<Epoch>,
    version: String,
    release: Option<String>,
}

impl Evr {
    /// Create a new Evr from a string and return it in a Result
    ///
    /// # Errors
    ///
    /// Returns an error if the epoch is not numeric or the version is
    /// empty.
    pub fn new(evr: &str) -> Result<Self, Error> {
        let (epoch, rest) = match evr.split_once(':') {
            Some((epoch, rest)) => (Some(Epoch::new(epoch)?), rest),
            None => (None, evr),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((version, release)) => (version, Some(release.to_string())),
            None => (rest, None),
        };

        if version.is_empty() || release.as_deref() == Some("") {
            return Err(Error::InvalidEvr(evr.to_string()));
        }

        Ok(Evr {
            epoch,
            version: version.to_string(),
            release,
        })
    }

    /// Create an Evr from its parts
    ///
    /// This is the constructor for metadata databases, which store the
    /// epoch, version and release in separate columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is empty.
    pub fn from_parts(
        epoch: Option<Epoch>,
        version: String,
        release: Option<String>,
    ) -> Result<Self, Error> {
        if version.is_empty() {
            return Err(Error::InvalidEvr(version));
        }

        Ok(Evr {
            epoch,
            version,
            release,
        })
    }

    /// Return the optional epoch
    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }

    /// Return the version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the optional release
    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    /// Compare two Evrs
    ///
    /// Epochs are compared numerically, with an absent epoch counting as
    /// `0`. On equal epochs the versions and then the releases are
    /// compared with [`segment_compare`]. An absent release compares
    /// equal to any release.
    pub fn compare(&self, other: &Evr) -> Ordering {
        let self_epoch = self.epoch.unwrap_or(Epoch(0));
        let other_epoch = other.epoch.unwrap_or(Epoch(0));
        if self_epoch != other_epoch {
            return self_epoch.cmp(&other_epoch);
        }

        let version_cmp = segment_compare(&self.version, &other.version);
        if version_cmp.is_ne() {
            return version_cmp;
        }

        match (&self.release, &other.release) {
            (Some(self_release), Some(other_release)) => {
                segment_compare(self_release, other_release)
            }
            (_, _) => Ordering::Equal,
        }
    }

    /// Compare two Evrs and return a number
    ///
    /// * `1` if `a` is newer than `b`
    /// * `0` if `a` and `b` are considered to be the same version
    /// * `-1` if `a` is older than `b`
    ///
    /// ## Examples
    /// ```
    /// use std::str::FromStr;
    /// use ryum_types::Evr;
    ///
    /// let old = Evr::from_str("1.0-1").unwrap();
    /// let new = Evr::from_str("2.0-1").unwrap();
    /// assert_eq!(Evr::vercmp(&new, &old), 1);
    /// assert_eq!(Evr::vercmp(&old, &old), 0);
    /// assert_eq!(Evr::vercmp(&old, &new), -1);
    /// ```
    pub fn vercmp(a: &Evr, b: &Evr) -> i8 {
        match a.compare(b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

impl FromStr for Evr {
    type Err = Error;
    /// Create an Evr from a string and return it in a Result
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Evr::new(input)
    }
}

impl Display for Evr {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        if let Some(epoch) = self.epoch() {
            write!(fmt, "{epoch}:")?;
        }

        write!(fmt, "{}", self.version())?;

        if let Some(release) = self.release() {
            write!(fmt, "-{release}")?;
        }

        Ok(())
    }
}

impl Serialize for Evr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other).is_eq()
    }
}

impl Eq for Evr {}

/// Compare two version (or release) strings with the rpm segment rules
///
/// Both inputs are split into maximal runs of ASCII digits and maximal
/// runs of ASCII letters; everything else separates segments. Numeric
/// runs are compared numerically (leading zeros dropped, the longer
/// remaining run wins), alphabetic runs lexicographically, and a numeric
/// run outranks an alphabetic one. A `~` sorts before every other token,
/// including the end of the string, which makes it usable as a
/// pre-release marker (`1.0~rc1` < `1.0`).
pub fn segment_compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut one = 0;
    let mut two = 0;

    while one < a.len() || two < b.len() {
        // everything that is neither alphanumeric nor a tilde separates
        // segments and carries no ordering weight of its own
        while one < a.len() && !a[one].is_ascii_alphanumeric() && a[one] != b'~' {
            one += 1;
        }
        while two < b.len() && !b[two].is_ascii_alphanumeric() && b[two] != b'~' {
            two += 1;
        }

        let one_tilde = one < a.len() && a[one] == b'~';
        let two_tilde = two < b.len() && b[two] == b'~';
        if one_tilde || two_tilde {
            if !two_tilde {
                return Ordering::Less;
            }
            if !one_tilde {
                return Ordering::Greater;
            }
            one += 1;
            two += 1;
            continue;
        }

        if one >= a.len() || two >= b.len() {
            break;
        }

        // walk both sides to the end of the current run, typed after the
        // first side
        let numeric = a[one].is_ascii_digit();
        let segment_end = |s: &[u8], mut i: usize| {
            while i < s.len()
                && (numeric && s[i].is_ascii_digit() || !numeric && s[i].is_ascii_alphabetic())
            {
                i += 1;
            }
            i
        };
        let one_end = segment_end(a, one);
        let two_end = segment_end(b, two);

        // mixed segment types: the numeric one is newer
        if two == two_end {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut one_seg = &a[one..one_end];
        let mut two_seg = &b[two..two_end];

        if numeric {
            while one_seg.first() == Some(&b'0') {
                one_seg = &one_seg[1..];
            }
            while two_seg.first() == Some(&b'0') {
                two_seg = &two_seg[1..];
            }

            // more digits left after dropping zeros means a bigger number
            if one_seg.len() != two_seg.len() {
                return one_seg.len().cmp(&two_seg.len());
            }
        }

        if one_seg != two_seg {
            return one_seg.cmp(two_seg);
        }

        one = one_end;
        two = two_end;
    }

    match (one >= a.len(), two >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, _) => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", Ok(Epoch(0)))]
    #[case("1", Ok(Epoch(1)))]
    #[case("42", Ok(Epoch(42)))]
    #[case("-1", Err(Error::InvalidEpoch("-1".to_string())))]
    #[case("one", Err(Error::InvalidEpoch("one".to_string())))]
    #[case("", Err(Error::InvalidEpoch("".to_string())))]
    fn epoch_from_str(#[case] input: &str, #[case] result: Result<Epoch, Error>) {
        assert_eq!(result, Epoch::from_str(input));
    }

    #[rstest]
    #[case("1.0", None, "1.0", None)]
    #[case("1.0-1", None, "1.0", Some("1"))]
    #[case("2:1.0-1.fc12", Some(2), "1.0", Some("1.fc12"))]
    #[case("0:1.0", Some(0), "1.0", None)]
    #[case("1.0-1-2", None, "1.0-1", Some("2"))]
    fn evr_from_str(
        #[case] input: &str,
        #[case] epoch: Option<u64>,
        #[case] version: &str,
        #[case] release: Option<&str>,
    ) {
        let evr = Evr::from_str(input).unwrap();
        assert_eq!(epoch, evr.epoch().map(|e| e.inner()));
        assert_eq!(version, evr.version());
        assert_eq!(release, evr.release());
    }

    #[rstest]
    #[case("")]
    #[case(":1.0")]
    #[case("x:1.0")]
    #[case("1.0-")]
    #[case("1:")]
    fn evr_from_str_invalid(#[case] input: &str) {
        assert!(Evr::from_str(input).is_err());
    }

    #[rstest]
    #[case("1.0", "1.0")]
    #[case("1.0-1", "1.0-1")]
    #[case("2:1.0-1", "2:1.0-1")]
    #[case("0:1.0", "0:1.0")]
    fn evr_to_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, format!("{}", Evr::from_str(input).unwrap()));
    }

    #[rstest]
    #[case("1.0", "1.0", Ordering::Equal)]
    #[case("1.0", "2.0", Ordering::Less)]
    #[case("2.0", "1.0", Ordering::Greater)]
    #[case("2.0.1", "2.0.1", Ordering::Equal)]
    #[case("2.0", "2.0.1", Ordering::Less)]
    #[case("2.0.1a", "2.0.1a", Ordering::Equal)]
    #[case("2.0.1a", "2.0.1", Ordering::Greater)]
    #[case("5.5p1", "5.5p2", Ordering::Less)]
    #[case("5.5p10", "5.5p1", Ordering::Greater)]
    #[case("10xyz", "10.1xyz", Ordering::Less)]
    #[case("xyz10", "xyz10.1", Ordering::Less)]
    #[case("xyz.4", "xyz.4", Ordering::Equal)]
    #[case("xyz.4", "8", Ordering::Less)]
    #[case("2.0.1", "2_0_1", Ordering::Equal)]
    #[case("fc4", "fc.4", Ordering::Equal)]
    #[case("FC5", "fc4", Ordering::Less)]
    #[case("2a", "2.0", Ordering::Less)]
    #[case("1.0", "1.fc4", Ordering::Greater)]
    #[case("3.0.0_fc", "3.0.0.fc", Ordering::Equal)]
    #[case("4.999.9", "5.0", Ordering::Less)]
    #[case("20101121", "20101122", Ordering::Less)]
    #[case("1", "01", Ordering::Equal)]
    #[case("001a", "1a", Ordering::Equal)]
    #[case("1.0~rc1", "1.0", Ordering::Less)]
    #[case("1.0~rc1", "1.0~rc1", Ordering::Equal)]
    #[case("1.0~rc1", "1.0~rc2", Ordering::Less)]
    #[case("1.0~rc1~git123", "1.0~rc1", Ordering::Less)]
    #[case("1.0~rc1~git123", "1.0~rc1~git124", Ordering::Less)]
    fn segment_compare_cases(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(expected, segment_compare(a, b));
        assert_eq!(expected.reverse(), segment_compare(b, a));
    }

    #[rstest]
    #[case("1.0", "1.0", 0)]
    #[case("1:1.0", "2.0", 1)]
    #[case("1.0", "1:0.5", -1)]
    #[case("0:1.0", "1.0", 0)]
    #[case("1.0-1", "1.0-2", -1)]
    #[case("1.0-1", "1.0", 0)]
    #[case("1.0", "1.0-2", 0)]
    #[case("1.0-1.fc12", "1.0-1.fc13", -1)]
    fn evr_vercmp(#[case] a: &str, #[case] b: &str, #[case] expected: i8) {
        let a = Evr::from_str(a).unwrap();
        let b = Evr::from_str(b).unwrap();
        assert_eq!(expected, Evr::vercmp(&a, &b));
        assert_eq!(-expected, Evr::vercmp(&b, &a));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn evr_compare_reflexive(s in r"([1-9][0-9]{0,3}:)?[0-9a-zA-Z][0-9a-zA-Z.~_+]{0,12}(-[0-9a-zA-Z][0-9a-zA-Z.]{0,5})?") {
            let evr = Evr::from_str(&s).unwrap();
            prop_assert_eq!(Evr::vercmp(&evr, &evr), 0);
        }

        #[test]
        fn evr_compare_antisymmetric(
            a in r"[0-9a-zA-Z][0-9a-zA-Z.~]{0,8}",
            b in r"[0-9a-zA-Z][0-9a-zA-Z.~]{0,8}",
        ) {
            let a = Evr::from_str(&a).unwrap();
            let b = Evr::from_str(&b).unwrap();
            prop_assert_eq!(Evr::vercmp(&a, &b), -Evr::vercmp(&b, &a));
        }

        #[test]
        fn evr_compare_transitive(
            a in r"[0-9a-zA-Z][0-9a-zA-Z.~]{0,8}",
            b in r"[0-9a-zA-Z][0-9a-zA-Z.~]{0,8}",
            c in r"[0-9a-zA-Z][0-9a-zA-Z.~]{0,8}",
        ) {
            let a = Evr::from_str(&a).unwrap();
            let b = Evr::from_str(&b).unwrap();
            let c = Evr::from_str(&c).unwrap();
            if Evr::vercmp(&a, &b) <= 0 && Evr::vercmp(&b, &c) <= 0 {
                prop_assert!(Evr::vercmp(&a, &c) <= 0);
            }
        }

        #[test]
        fn evr_display_round_trip(s in r"((0|[1-9][0-9]{0,3}):)?[0-9a-zA-Z][0-9a-zA-Z.~_+]{0,12}(-[0-9a-zA-Z][0-9a-zA-Z.]{0,5})?") {
            let evr = Evr::from_str(&s).unwrap();
            prop_assert_eq!(s, format!("{}", evr));
        }
    }
}
