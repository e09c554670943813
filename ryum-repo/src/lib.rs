#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod error;
pub use error::Error;

mod iter;
pub use iter::PackageIter;

mod package;
pub use package::DependencyKind;
pub use package::Package;
pub use package::PackageKey;

mod query;
pub use query::PackageQuery;
pub use query::Query;

mod rpmdb;
pub use rpmdb::RPMDB_REPO_ID;
pub use rpmdb::RpmdbRepo;

pub mod schema;

mod set;
pub use set::RepoSet;

mod sqlite;
pub use sqlite::RepoConfig;
pub use sqlite::SqliteRepo;
