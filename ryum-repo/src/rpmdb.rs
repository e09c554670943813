//! The installed-system backend.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::rc::Weak;
use std::str::FromStr;

use log::debug;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use ryum_types::Architecture;
use ryum_types::Evr;
use ryum_types::Name;
use ryum_types::PackageId;

use crate::Error;
use crate::Package;
use crate::PackageIter;
use crate::PackageQuery;
use crate::Query;
use crate::iter::query_matches;
use crate::package::DepSource;
use crate::package::DependencyKind;
use crate::package::PackageKey;
use crate::package::PackageRow;
use crate::package::dependency_from_row;

/// The fixed repository id of the installed system.
pub const RPMDB_REPO_ID: &str = "rpmdb";

/// Public-key pseudo packages are metadata, not installable software;
/// the iterator hides them.
const PUBKEY_NAME: &str = "gpg-pubkey";

/// The header tags the installed-package database is indexed by.
///
/// Querying by tag is the backend's only database primitive; everything
/// richer (dependency senses, details matching) is filtered in-process
/// on top of a tag query.
#[derive(Clone, Debug)]
enum Tag {
    All,
    Name(String),
    ProvideName(String),
    RequireName(String),
    ConflictName(String),
    ObsoleteName(String),
    Basenames(String),
}

impl Tag {
    fn for_query(query: &Query) -> Tag {
        match query {
            Query::ListAll | Query::Details(_) => Tag::All,
            Query::ListByName(name) => Tag::Name(name.inner().to_string()),
            Query::WhatProvides(dep) => Tag::ProvideName(dep.name.clone()),
            Query::WhatRequires(dep) => Tag::RequireName(dep.name.clone()),
            Query::WhatConflicts(dep) => Tag::ConflictName(dep.name.clone()),
            Query::WhatObsoletes(dep) => Tag::ObsoleteName(dep.name.clone()),
            Query::WhatContainsFile(path) => Tag::Basenames(path.clone()),
        }
    }
}

/// The read-only view of the packages installed on the system
///
/// Opened once and shared; dropping the last handle closes the
/// database. Packages are interned per header id, so repeated lookups
/// of the same installed package return the same [`Package`] entity.
///
/// Installed packages carry no location and no digest; they cannot be
/// downloaded.
pub struct RpmdbRepo {
    conn: Connection,
    interned: RefCell<HashMap<PackageId, Rc<Package>>>,
    weak_self: RefCell<Weak<RpmdbRepo>>,
}

impl std::fmt::Debug for RpmdbRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpmdbRepo")
            .field("interned", &self.interned.borrow().len())
            .finish_non_exhaustive()
    }
}

impl RpmdbRepo {
    /// Open the installed-package database read-only
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if the database file is absent
    /// and [`Error::Database`] if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Rc<Self>, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigMissing {
                repo_id: RPMDB_REPO_ID.to_string(),
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::Database {
            repo_id: RPMDB_REPO_ID.to_string(),
            source,
        })?;

        debug!("opened installed-package database at {}", path.display());

        let repo = Rc::new(RpmdbRepo {
            conn,
            interned: RefCell::new(HashMap::new()),
            weak_self: RefCell::new(Weak::new()),
        });
        *repo.weak_self.borrow_mut() = Rc::downgrade(&repo);
        Ok(repo)
    }

    /// Return the repository id
    pub fn id(&self) -> &str {
        RPMDB_REPO_ID
    }

    /// Return the display name
    pub fn name(&self) -> &str {
        "installed"
    }

    /// Return the number of distinct packages handed out so far
    pub fn interned_count(&self) -> usize {
        self.interned.borrow().len()
    }

    fn database_error(&self, source: rusqlite::Error) -> Error {
        Error::Database {
            repo_id: RPMDB_REPO_ID.to_string(),
            source,
        }
    }

    /// Run the query-by-tag primitive and return candidate row keys.
    fn tag_query(&self, tag: &Tag) -> Result<VecDeque<i64>, Error> {
        let (sql, param) = match tag {
            Tag::All => ("SELECT pkgKey FROM packages ORDER BY pkgKey", None),
            Tag::Name(name) => (
                "SELECT pkgKey FROM packages WHERE name = ?1 ORDER BY pkgKey",
                Some(name),
            ),
            Tag::ProvideName(name) => (
                "SELECT DISTINCT pkgKey FROM provides WHERE name = ?1 ORDER BY pkgKey",
                Some(name),
            ),
            Tag::RequireName(name) => (
                "SELECT DISTINCT pkgKey FROM requires WHERE name = ?1 ORDER BY pkgKey",
                Some(name),
            ),
            Tag::ConflictName(name) => (
                "SELECT DISTINCT pkgKey FROM conflicts WHERE name = ?1 ORDER BY pkgKey",
                Some(name),
            ),
            Tag::ObsoleteName(name) => (
                "SELECT DISTINCT pkgKey FROM obsoletes WHERE name = ?1 ORDER BY pkgKey",
                Some(name),
            ),
            Tag::Basenames(path) => (
                "SELECT DISTINCT pkgKey FROM files WHERE name = ?1 ORDER BY pkgKey",
                Some(path),
            ),
        };

        let mut stmt = self.conn.prepare(sql).map_err(|e| self.database_error(e))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(param.into_iter()), |row| {
                row.get(0)
            })
            .map_err(|e| self.database_error(e))?;

        rows.collect::<Result<VecDeque<i64>, _>>()
            .map_err(|e| self.database_error(e))
    }

    /// Materialize (or fetch the interned handle of) one package row.
    fn materialize(&self, pkg_key: i64) -> Result<Rc<Package>, Error> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT pkgId, name, epoch, version, release, arch, summary, description, \
                 url, license, size_installed \
                 FROM packages WHERE pkgKey = ?1",
            )
            .map_err(|e| self.database_error(e))?;

        let row = stmt
            .query_row([pkg_key], |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<i64>>(10)?,
                ))
            })
            .map_err(|e| self.database_error(e))?;

        let (blob, name, epoch, version, release, arch, summary, description, url, license, size) =
            row;

        let id = PackageId::from_bytes(<[u8; 16]>::try_from(blob.as_slice()).map_err(|_| {
            Error::InvalidRow {
                repo_id: RPMDB_REPO_ID.to_string(),
                detail: format!("package id of {name} is not 16 bytes"),
            }
        })?);

        if let Some(pkg) = self.interned.borrow().get(&id) {
            return Ok(Rc::clone(pkg));
        }

        let epoch = epoch.map(|e| e.parse::<ryum_types::Epoch>()).transpose()?;
        let row = PackageRow {
            key: PackageKey::Rpmdb { pkg_key, id },
            name: Name::from_str(&name)?,
            evr: Evr::from_parts(epoch, version, release)?,
            arch: Architecture::from_str(&arch).map_err(|_| {
                ryum_types::Error::UnknownArchitecture(arch.clone())
            })?,
            summary: summary.unwrap_or_default(),
            description: description.unwrap_or_default(),
            url,
            license,
            size_package: 0,
            size_installed: size.and_then(|s| u64::try_from(s).ok()).unwrap_or_default(),
            location_href: None,
            digest: None,
            repo_id: RPMDB_REPO_ID.to_string(),
        };

        let source: Weak<dyn DepSource> = self.weak_self.borrow().clone();
        let pkg = Rc::new(Package::new(row, source));
        self.interned.borrow_mut().insert(id, Rc::clone(&pkg));
        Ok(pkg)
    }
}

impl DepSource for RpmdbRepo {
    fn load_dependencies(
        &self,
        key: &PackageKey,
        kind: DependencyKind,
    ) -> Result<Vec<ryum_types::Dependency>, Error> {
        let sql = format!(
            "SELECT name, flags, epoch, version, release FROM {} WHERE pkgKey = ?1",
            kind.table()
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| self.database_error(e))?;

        let rows = stmt
            .query_map([key.pkg_key()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|e| self.database_error(e))?;

        let mut deps = Vec::new();
        for row in rows {
            let (name, flags, epoch, version, release) =
                row.map_err(|e| self.database_error(e))?;
            deps.push(dependency_from_row(
                RPMDB_REPO_ID,
                name,
                flags,
                epoch,
                version,
                release,
            )?);
        }
        Ok(deps)
    }

    fn load_files(&self, key: &PackageKey) -> Result<Vec<String>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM files WHERE pkgKey = ?1")
            .map_err(|e| self.database_error(e))?;

        let rows = stmt
            .query_map([key.pkg_key()], |row| row.get(0))
            .map_err(|e| self.database_error(e))?;

        rows.collect::<Result<Vec<String>, _>>()
            .map_err(|e| self.database_error(e))
    }
}

impl PackageQuery for Rc<RpmdbRepo> {
    fn search(&self, query: &Query) -> Result<PackageIter, Error> {
        let keys = self.tag_query(&Tag::for_query(query))?;
        Ok(PackageIter::Rpmdb(RpmdbIter {
            repo: Rc::clone(self),
            keys,
            query: query.clone(),
        }))
    }
}

/// Iterator over installed-package query results.
#[derive(Debug)]
pub struct RpmdbIter {
    repo: Rc<RpmdbRepo>,
    keys: VecDeque<i64>,
    query: Query,
}

impl Iterator for RpmdbIter {
    type Item = Result<Rc<Package>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pkg_key) = self.keys.pop_front() {
            let pkg = match self.repo.materialize(pkg_key) {
                Ok(pkg) => pkg,
                Err(error) => return Some(Err(error)),
            };

            if pkg.name().inner() == PUBKEY_NAME {
                continue;
            }

            match query_matches(&pkg, &self.query) {
                Ok(true) => return Some(Ok(pkg)),
                Ok(false) => continue,
                Err(error) => return Some(Err(error)),
            }
        }

        None
    }
}
