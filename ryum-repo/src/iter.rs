use std::rc::Rc;

use ryum_types::Dependency;

use crate::Error;
use crate::Package;
use crate::Query;
use crate::rpmdb::RpmdbIter;
use crate::set::SetIter;
use crate::sqlite::SqliteIter;

/// A lazy, single-pass iterator over query results
///
/// One variant per backend; all variants yield shared [`Package`]
/// handles and surface backend failures as `Err` items. Iterators are
/// forward-only: each matching package is yielded exactly once.
#[derive(Debug)]
pub enum PackageIter {
    /// Results from the installed-package database.
    Rpmdb(RpmdbIter),
    /// Results from one available repository.
    Sqlite(SqliteIter),
    /// Results from a repository set union.
    Set(SetIter),
}

impl Iterator for PackageIter {
    type Item = Result<Rc<Package>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PackageIter::Rpmdb(iter) => iter.next(),
            PackageIter::Sqlite(iter) => iter.next(),
            PackageIter::Set(iter) => iter.next(),
        }
    }
}

/// Returns `true` if a materialized package passes the in-process
/// predicate of `query`.
///
/// The backends narrow candidates by capability name in SQL; the
/// version-sense part of a dependency query (and the details substring
/// check for the installed backend) happens here, against the package's
/// lazily loaded lists.
pub(crate) fn query_matches(pkg: &Rc<Package>, query: &Query) -> Result<bool, Error> {
    Ok(match query {
        Query::ListAll | Query::ListByName(_) => true,
        Query::WhatContainsFile(path) => pkg.files()?.iter().any(|file| file == path),
        Query::WhatProvides(dep) => any_satisfied_by(dep, pkg.provides()?),
        Query::WhatRequires(dep) => pkg.requires()?.iter().any(|req| req.satisfies(dep)),
        Query::WhatConflicts(dep) => pkg.conflicts()?.iter().any(|con| con.satisfies(dep)),
        Query::WhatObsoletes(dep) => pkg.obsoletes()?.iter().any(|obs| obs.satisfies(dep)),
        Query::Details(pattern) => {
            pkg.name().inner().contains(pattern)
                || pkg.summary().contains(pattern)
                || pkg.description().contains(pattern)
                || pkg.url().is_some_and(|url| url.contains(pattern))
        }
    })
}

fn any_satisfied_by(required: &Dependency, provides: &[Dependency]) -> bool {
    provides.iter().any(|provide| required.satisfies(provide))
}
