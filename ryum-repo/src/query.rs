use ryum_types::Dependency;
use ryum_types::Name;

use crate::Error;
use crate::PackageIter;

/// One capability query against a repository
///
/// Every backend answers the same queries; a [`Query`] value carries the
/// query arguments so that the repository-set union iterator can replay
/// the same query against each member repository.
#[derive(Clone, Debug)]
pub enum Query {
    /// Every package.
    ListAll,
    /// Packages with exactly this name.
    ListByName(Name),
    /// Packages with a provide satisfying the dependency.
    WhatProvides(Dependency),
    /// Packages with a requirement satisfied by the given capability.
    WhatRequires(Dependency),
    /// Packages with a conflict matching the given capability.
    WhatConflicts(Dependency),
    /// Packages with an obsolete matching the given capability.
    WhatObsoletes(Dependency),
    /// Packages whose file list contains the absolute path.
    WhatContainsFile(String),
    /// Packages whose name, summary, description or URL contains the
    /// substring (case sensitive).
    Details(String),
}

/// The uniform query surface over package repositories
///
/// Implemented by the installed backend, the available backend, and the
/// repository set. All queries return a lazy, single-pass
/// [`PackageIter`].
pub trait PackageQuery {
    /// Run a [`Query`] and return the matching packages
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database query fails.
    fn search(&self, query: &Query) -> Result<PackageIter, Error>;

    /// List every package
    fn list_all(&self) -> Result<PackageIter, Error> {
        self.search(&Query::ListAll)
    }

    /// List the packages with exactly the given name
    fn list_by_name(&self, name: &Name) -> Result<PackageIter, Error> {
        self.search(&Query::ListByName(name.clone()))
    }

    /// Find packages providing a capability satisfying `dep`
    fn search_provides(&self, dep: &Dependency) -> Result<PackageIter, Error> {
        self.search(&Query::WhatProvides(dep.clone()))
    }

    /// Find packages with a requirement satisfied by `dep`
    fn search_requires(&self, dep: &Dependency) -> Result<PackageIter, Error> {
        self.search(&Query::WhatRequires(dep.clone()))
    }

    /// Find packages with a conflict matching `dep`
    fn search_conflicts(&self, dep: &Dependency) -> Result<PackageIter, Error> {
        self.search(&Query::WhatConflicts(dep.clone()))
    }

    /// Find packages with an obsolete matching `dep`
    fn search_obsoletes(&self, dep: &Dependency) -> Result<PackageIter, Error> {
        self.search(&Query::WhatObsoletes(dep.clone()))
    }

    /// Find packages whose file list contains the absolute path
    fn search_files(&self, path: &str) -> Result<PackageIter, Error> {
        self.search(&Query::WhatContainsFile(path.to_string()))
    }

    /// Find packages matching a details substring
    fn search_details(&self, pattern: &str) -> Result<PackageIter, Error> {
        self.search(&Query::Details(pattern.to_string()))
    }
}
