#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod checksum;
pub use checksum::DigestKind;

mod error;
pub use error::Error;

mod macros;
use macros::regex_once;

mod name;
pub use name::Name;

mod package;
pub use package::Nevra;
pub use package::PackageId;

mod relation;
pub use relation::Dependency;
pub use relation::DependencySense;

mod system;
pub use system::Architecture;

mod version;
pub use version::Epoch;
pub use version::Evr;
