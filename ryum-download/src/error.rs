use std::path::PathBuf;

/// The error that can occur when downloading and verifying artifacts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred at a path.
    #[error("I/O error at {path} while {context}: {source}")]
    IoPath {
        /// The path at which the error occurred.
        path: PathBuf,
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "I/O error at path
        /// while ".
        context: String,
        /// The source error.
        source: std::io::Error,
    },

    /// A transport-level failure talking to one mirror.
    ///
    /// Recovered by the mirrored-download loop, which marks the mirror
    /// bad and retries with the next one.
    #[error("transport error for {url}: {source}")]
    Transport {
        /// The URL of the failed transfer.
        url: String,
        /// The underlying transport failure.
        source: std::io::Error,
    },

    /// A mirror answered with a non-success HTTP status.
    #[error("HTTP error {code} for {url}")]
    Http {
        /// The URL of the failed transfer.
        url: String,
        /// The HTTP status code.
        code: u16,
    },

    /// The progress callback requested cancellation.
    #[error("transfer of {url} cancelled")]
    Cancelled {
        /// The URL of the cancelled transfer.
        url: String,
    },

    /// A downloaded file failed digest verification twice.
    #[error("digest mismatch for {path}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// The destination path of the artifact.
        path: PathBuf,
        /// The expected hex digest (or its prefix).
        expected: String,
        /// The computed hex digest.
        actual: String,
    },

    /// Every mirror in the list is marked bad.
    #[error("all mirrors failed while fetching {relative_path}")]
    AllMirrorsFailed {
        /// The repo-relative path that could not be fetched.
        relative_path: String,
    },
}
