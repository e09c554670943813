use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::Architecture;
use crate::Error;
use crate::Evr;
use crate::Name;

/// The 16-byte identifier of an installed package
///
/// The installed-package database keys every header with an opaque
/// 16-byte blob. The blob is rendered as (and parsed from) 32 lowercase
/// hex characters.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::PackageId;
///
/// let id = PackageId::from_str("00112233445566778899aabbccddeeff")?;
/// assert_eq!("00112233445566778899aabbccddeeff", format!("{id}"));
/// assert!(PackageId::from_str("too-short").is_err());
/// # Ok::<(), ryum_types::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PackageId([u8; 16]);

impl PackageId {
    /// Create a new PackageId from its raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        PackageId(bytes)
    }

    /// Return the raw bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl FromStr for PackageId {
    type Err = Error;
    /// Create a PackageId from 32 hex characters and return it in a Result
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.len() != 32 || !input.is_ascii() {
            return Err(Error::InvalidPackageId(input.to_string()));
        }

        let mut bytes = [0; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&input[i * 2..i * 2 + 2], 16)
                .map_err(|_| Error::InvalidPackageId(input.to_string()))?;
        }

        Ok(PackageId(bytes))
    }
}

impl Display for PackageId {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        for byte in self.0 {
            write!(fmt, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for PackageId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The (name, epoch, version, release, architecture) tuple of a package
///
/// A `Nevra` identifies one build of a package within a repository.
/// Equality follows [`Evr`] comparison semantics, so `foo-0:1.0-1.noarch`
/// and `foo-1.0-1.noarch` are the same package.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::{Architecture, Evr, Name, Nevra};
///
/// let nevra = Nevra::new(
///     Name::from_str("hello")?,
///     Evr::from_str("1.0-1")?,
///     Architecture::X86_64,
/// );
/// assert_eq!("hello-1.0-1.x86_64", format!("{nevra}"));
/// # Ok::<(), ryum_types::Error>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Nevra {
    name: Name,
    evr: Evr,
    arch: Architecture,
}

impl Nevra {
    /// Create a new Nevra
    pub fn new(name: Name, evr: Evr, arch: Architecture) -> Self {
        Nevra { name, evr, arch }
    }

    /// Return a reference to the package name
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Return a reference to the epoch-version-release triple
    pub fn evr(&self) -> &Evr {
        &self.evr
    }

    /// Return the architecture
    pub fn arch(&self) -> Architecture {
        self.arch
    }
}

impl Display for Nevra {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        write!(fmt, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}
