use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;
use strum::VariantNames;

/// CPU architecture
///
/// Members of the Architecture enum can be created from `&str`.
///
/// Every architecture carries a fixed list of architectures that are
/// installable on it, in preference order (see
/// [`Architecture::installable`]). `noarch` packages are installable
/// everywhere but never preferred over a native architecture.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
///
/// use ryum_types::Architecture;
///
/// assert_eq!(Architecture::from_str("x86_64"), Ok(Architecture::X86_64));
/// assert_eq!("x86_64", format!("{}", Architecture::X86_64));
/// assert!(Architecture::Noarch.is_installable_on(Architecture::Aarch64));
/// assert!(!Architecture::X86_64.is_installable_on(Architecture::I686));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    VariantNames,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// ARMv8 64-bit
    Aarch64,
    /// ARMv7 hard-float
    Armv7hl,
    /// Intel 386
    I386,
    /// Intel 486
    I486,
    /// Intel 586
    I586,
    /// Intel 686
    I686,
    /// Architecture independent
    Noarch,
    /// PowerPC 64-bit little-endian
    Ppc64le,
    /// RISC-V 64-bit
    Riscv64,
    /// IBM Z
    S390x,
    /// Intel x86_64
    X86_64,
}

impl Architecture {
    /// Return the architectures installable on this architecture, in
    /// preference order
    ///
    /// The native architecture comes first, compatible lesser
    /// architectures follow, `noarch` is always last.
    pub fn installable(&self) -> &'static [Architecture] {
        use Architecture::*;

        match self {
            X86_64 => &[X86_64, I686, I586, I486, I386, Noarch],
            I686 => &[I686, I586, I486, I386, Noarch],
            I586 => &[I586, I486, I386, Noarch],
            I486 => &[I486, I386, Noarch],
            I386 => &[I386, Noarch],
            Aarch64 => &[Aarch64, Noarch],
            Armv7hl => &[Armv7hl, Noarch],
            Ppc64le => &[Ppc64le, Noarch],
            Riscv64 => &[Riscv64, Noarch],
            S390x => &[S390x, Noarch],
            Noarch => &[Noarch],
        }
    }

    /// Returns `true` if a package of this architecture can be installed
    /// on a `host` of the given architecture
    pub fn is_installable_on(&self, host: Architecture) -> bool {
        host.installable().contains(self)
    }

    /// Returns `true` if this architecture and `other` can stand in for
    /// each other when pairing an update with its installed predecessor
    ///
    /// Architectures are compatible when either is installable on the
    /// other (which covers equal architectures, the 32-bit Intel chain,
    /// and `noarch` against anything).
    pub fn is_compatible_with(&self, other: Architecture) -> bool {
        self.is_installable_on(other) || other.is_installable_on(*self)
    }

    /// Compare two architectures by preference on a `host` system
    ///
    /// Returns [`Ordering::Greater`] when `a` is the better choice for
    /// `host`, [`Ordering::Less`] when `b` is. An architecture that is
    /// not installable on `host` always loses; two such architectures
    /// compare equal.
    pub fn choose_best_for_system(host: Architecture, a: Architecture, b: Architecture) -> Ordering {
        let preference = |arch| host.installable().iter().position(|c| *c == arch);

        // earlier in the installable list means preferred, so the order
        // of the positions is reversed
        match (preference(a), preference(b)) {
            (Some(a_pos), Some(b_pos)) => b_pos.cmp(&a_pos),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    /// Return the architecture of the running host
    pub fn host() -> Architecture {
        match std::env::consts::ARCH {
            "x86_64" => Architecture::X86_64,
            "x86" => Architecture::I686,
            "aarch64" => Architecture::Aarch64,
            "arm" => Architecture::Armv7hl,
            "powerpc64" => Architecture::Ppc64le,
            "riscv64" => Architecture::Riscv64,
            "s390x" => Architecture::S390x,
            _ => Architecture::Noarch,
        }
    }
}
