/// The error that can occur when working with ryum types.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An invalid package name.
    #[error("Invalid package name: {0}")]
    InvalidName(String),

    /// An invalid epoch (must be an unsigned integer).
    #[error("Invalid epoch: {0}")]
    InvalidEpoch(String),

    /// An invalid epoch-version-release string.
    #[error("Invalid EVR: {0}")]
    InvalidEvr(String),

    /// An invalid dependency string.
    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    /// An invalid dependency sense.
    #[error("Invalid dependency sense: {0}")]
    InvalidSense(String),

    /// An invalid package id (must be 32 hex characters).
    #[error("Invalid package id: {0}")]
    InvalidPackageId(String),

    /// An unknown CPU architecture.
    #[error("Unknown CPU architecture: {0}")]
    UnknownArchitecture(String),
}
