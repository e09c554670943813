/// The error that can occur when building and resolving transactions.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A repository query failed.
    #[error(transparent)]
    Repo(#[from] ryum_repo::Error),

    /// The transaction cannot be resolved.
    ///
    /// The offending packages, each with a reason, are in the
    /// transaction's [`unresolved`](crate::Transaction::unresolved)
    /// set. The transaction must not be executed.
    #[error("error resolving transaction")]
    Unresolved,
}
