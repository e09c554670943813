use std::path::PathBuf;

/// The error that can occur when querying package repositories.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An invalid value in a core type.
    #[error(transparent)]
    Types(#[from] ryum_types::Error),

    /// A metadata database failed.
    #[error("database error in repository {repo_id}: {source}")]
    Database {
        /// The id of the repository the database belongs to.
        repo_id: String,
        /// The underlying database error.
        source: rusqlite::Error,
    },

    /// A repository's metadata database is absent.
    ///
    /// Non-fatal for a repository set: the caller may skip the
    /// repository.
    #[error("repository {repo_id} has no metadata database at {path}")]
    ConfigMissing {
        /// The id of the repository.
        repo_id: String,
        /// The missing database path.
        path: PathBuf,
    },

    /// A malformed row in a metadata database.
    #[error("invalid row in repository {repo_id}: {detail}")]
    InvalidRow {
        /// The id of the repository.
        repo_id: String,
        /// What was wrong with the row.
        detail: String,
    },

    /// A package outlived its repository.
    #[error("repository {repo_id} has been closed")]
    RepoClosed {
        /// The id of the closed repository.
        repo_id: String,
    },

    /// A repository id is already present in the set.
    #[error("repository {repo_id} is already in the set")]
    DuplicateRepo {
        /// The duplicated repository id.
        repo_id: String,
    },

    /// A repository id is not present in the set.
    #[error("no repository {repo_id} in the set")]
    UnknownRepo {
        /// The unknown repository id.
        repo_id: String,
    },

    /// A repository has neither a base URL nor a mirrorlist.
    #[error("repository {repo_id} has no mirrors configured")]
    NoMirrors {
        /// The id of the repository.
        repo_id: String,
    },

    /// A repository's mirrorlist could not be loaded.
    #[error("failed to load the mirrorlist of repository {repo_id}: {source}")]
    Mirrorlist {
        /// The id of the repository.
        repo_id: String,
        /// The underlying download-layer error.
        source: ryum_download::Error,
    },
}
