//! The available-packages backend.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::rc::Weak;
use std::str::FromStr;

use log::debug;
use rusqlite::Connection;
use ryum_download::MirrorList;
use ryum_types::Architecture;
use ryum_types::DigestKind;
use ryum_types::Epoch;
use ryum_types::Evr;
use ryum_types::Name;

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

/// The definition of one available repository
///
/// Produced by the external configuration loader; consumed by
/// [`SqliteRepo::open`]. The metadata database paths point into the
/// download cache.
#[derive(Clone, Debug)]
pub struct RepoConfig {
    /// The unique repository id.
    pub id: String,
    /// The human-readable display name.
    pub name: String,
    /// Whether the repository takes part in queries.
    pub enabled: bool,
    /// The fixed base URL, if the repository has one.
    pub baseurl: Option<String>,
    /// The cached mirrorlist file, if the repository uses mirrors.
    pub mirrorlist: Option<PathBuf>,
    /// The primary metadata database.
    pub primary_db: PathBuf,
    /// The filelists metadata database, if present.
    pub filelists_db: Option<PathBuf>,
    /// The delta metadata file, if the repository offers deltas.
    pub delta_metadata: Option<PathBuf>,
}

/// One available repository, read from its metadata databases
///
/// The filelists database, when present, is attached to the primary
/// database connection so file queries can see the complete file lists.
/// Packages are interned per row key, so repeated lookups of the same
/// package return the same [`Package`] entity.
pub struct SqliteRepo {
    id: String,
    name: String,
    enabled: Cell<bool>,
    baseurl: Option<String>,
    mirrorlist: Option<PathBuf>,
    delta_metadata: Option<PathBuf>,
    has_filelists: bool,
    conn: Connection,
    interned: RefCell<HashMap<i64, Rc<Package>>>,
    weak_self: RefCell<Weak<SqliteRepo>>,
}

impl std::fmt::Debug for SqliteRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepo")
            .field("id", &self.id)
            .field("enabled", &self.enabled.get())
            .finish_non_exhaustive()
    }
}

impl SqliteRepo {
    /// Open an available repository from its metadata databases
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if the primary database is
    /// absent (callers may treat this as "skip the repository") and
    /// [`Error::Database`] if opening or attaching fails.
    pub fn open(config: RepoConfig) -> Result<Rc<Self>, Error> {
        if !config.primary_db.exists() {
            return Err(Error::ConfigMissing {
                repo_id: config.id,
                path: config.primary_db,
            });
        }

        let database_error = |repo_id: &str, source| Error::Database {
            repo_id: repo_id.to_string(),
            source,
        };

        let conn = Connection::open(&config.primary_db)
            .map_err(|e| database_error(&config.id, e))?;

        let has_filelists = match &config.filelists_db {
            Some(filelists) if filelists.exists() => {
                conn.execute(
                    "ATTACH DATABASE ?1 AS filelists",
                    [filelists.to_string_lossy().into_owned()],
                )
                .map_err(|e| database_error(&config.id, e))?;
                true
            }
            _ => false,
        };

        debug!(
            "opened repository '{}' from {} (filelists: {has_filelists})",
            config.id,
            config.primary_db.display(),
        );

        let repo = Rc::new(SqliteRepo {
            id: config.id,
            name: config.name,
            enabled: Cell::new(config.enabled),
            baseurl: config.baseurl,
            mirrorlist: config.mirrorlist,
            delta_metadata: config.delta_metadata,
            has_filelists,
            conn,
            interned: RefCell::new(HashMap::new()),
            weak_self: RefCell::new(Weak::new()),
        });
        *repo.weak_self.borrow_mut() = Rc::downgrade(&repo);
        Ok(repo)
    }

    /// Return the repository id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the repository takes part in queries
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable the repository
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Return the delta metadata file, if the repository offers deltas
    pub fn delta(&self) -> Option<&Path> {
        self.delta_metadata.as_deref()
    }

    /// Build the mirror list used to download from this repository
    ///
    /// A configured base URL yields a single-mirror list; otherwise the
    /// cached mirrorlist file is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMirrors`] if neither is configured and
    /// [`Error::Mirrorlist`] if the mirrorlist file cannot be read.
    pub fn mirror_list(&self) -> Result<MirrorList, Error> {
        if let Some(baseurl) = &self.baseurl {
            return Ok(MirrorList::from_urls([baseurl.clone()]));
        }

        let Some(mirrorlist) = &self.mirrorlist else {
            return Err(Error::NoMirrors {
                repo_id: self.id.clone(),
            });
        };

        MirrorList::from_file(mirrorlist).map_err(|source| Error::Mirrorlist {
            repo_id: self.id.clone(),
            source,
        })
    }

    fn database_error(&self, source: rusqlite::Error) -> Error {
        Error::Database {
            repo_id: self.id.clone(),
            source,
        }
    }

    /// Resolve a query to candidate row keys with one indexed SQL query.
    fn candidate_keys(&self, query: &Query) -> Result<VecDeque<i64>, Error> {
        let keyed = |sql: &str, param: &str| -> Result<VecDeque<i64>, Error> {
            let mut stmt = self.conn.prepare(sql).map_err(|e| self.database_error(e))?;
            let rows = stmt
                .query_map([param], |row| row.get(0))
                .map_err(|e| self.database_error(e))?;
            rows.collect::<Result<VecDeque<i64>, _>>()
                .map_err(|e| self.database_error(e))
        };

        match query {
            Query::ListAll => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT pkgKey FROM packages ORDER BY pkgKey")
                    .map_err(|e| self.database_error(e))?;
                let rows = stmt
                    .query_map([], |row| row.get(0))
                    .map_err(|e| self.database_error(e))?;
                rows.collect::<Result<VecDeque<i64>, _>>()
                    .map_err(|e| self.database_error(e))
            }
            Query::ListByName(name) => keyed(
                "SELECT pkgKey FROM packages WHERE name = ?1 ORDER BY pkgKey",
                name.inner(),
            ),
            Query::WhatProvides(dep) => keyed(
                "SELECT DISTINCT pkgKey FROM provides WHERE name = ?1 ORDER BY pkgKey",
                &dep.name,
            ),
            Query::WhatRequires(dep) => keyed(
                "SELECT DISTINCT pkgKey FROM requires WHERE name = ?1 ORDER BY pkgKey",
                &dep.name,
            ),
            Query::WhatConflicts(dep) => keyed(
                "SELECT DISTINCT pkgKey FROM conflicts WHERE name = ?1 ORDER BY pkgKey",
                &dep.name,
            ),
            Query::WhatObsoletes(dep) => keyed(
                "SELECT DISTINCT pkgKey FROM obsoletes WHERE name = ?1 ORDER BY pkgKey",
                &dep.name,
            ),
            Query::WhatContainsFile(path) => self.file_candidates(path),
            Query::Details(pattern) => keyed(
                "SELECT pkgKey FROM packages \
                 WHERE instr(name, ?1) > 0 OR instr(summary, ?1) > 0 \
                 OR instr(description, ?1) > 0 OR instr(url, ?1) > 0 \
                 ORDER BY pkgKey",
                pattern,
            ),
        }
    }

    /// Candidate keys for a file query.
    ///
    /// The primary database only knows the primary file subset; the
    /// attached filelists database is consulted by directory name. The
    /// per-package basename check happens against the materialized file
    /// list.
    fn file_candidates(&self, path: &str) -> Result<VecDeque<i64>, Error> {
        let mut keys = VecDeque::new();
        let mut seen = HashSet::new();

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT pkgKey FROM files WHERE name = ?1 ORDER BY pkgKey")
            .map_err(|e| self.database_error(e))?;
        let rows = stmt
            .query_map([path], |row| row.get(0))
            .map_err(|e| self.database_error(e))?;
        for key in rows {
            let key: i64 = key.map_err(|e| self.database_error(e))?;
            if seen.insert(key) {
                keys.push_back(key);
            }
        }

        if self.has_filelists {
            let dirname = match path.rsplit_once('/') {
                Some(("", _)) => "/",
                Some((dirname, _)) => dirname,
                None => return Ok(keys),
            };

            let mut stmt = self
                .conn
                .prepare(
                    "SELECT DISTINCT pkgKey FROM filelists.filelist \
                     WHERE dirname = ?1 ORDER BY pkgKey",
                )
                .map_err(|e| self.database_error(e))?;
            let rows = stmt
                .query_map([dirname], |row| row.get(0))
                .map_err(|e| self.database_error(e))?;
            for key in rows {
                let key: i64 = key.map_err(|e| self.database_error(e))?;
                if seen.insert(key) {
                    keys.push_back(key);
                }
            }
        }

        Ok(keys)
    }

    /// Materialize (or fetch the interned handle of) one package row.
    fn materialize(&self, pkg_key: i64) -> Result<Rc<Package>, Error> {
        if let Some(pkg) = self.interned.borrow().get(&pkg_key) {
            return Ok(Rc::clone(pkg));
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT pkgId, name, arch, version, epoch, release, summary, description, \
                 url, rpm_license, size_package, size_installed, location_href, checksum_type \
                 FROM packages WHERE pkgKey = ?1",
            )
            .map_err(|e| self.database_error(e))?;

        let row = stmt
            .query_row([pkg_key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<i64>>(10)?,
                    row.get::<_, Option<i64>>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, Option<String>>(13)?,
                ))
            })
            .map_err(|e| self.database_error(e))?;

        let (
            pkg_id,
            name,
            arch,
            version,
            epoch,
            release,
            summary,
            description,
            url,
            license,
            size_package,
            size_installed,
            location_href,
            checksum_type,
        ) = row;

        let epoch = epoch.map(|e| e.parse::<Epoch>()).transpose()?;
        let to_size = |s: Option<i64>| s.and_then(|s| u64::try_from(s).ok()).unwrap_or_default();
        let digest = checksum_type
            .map(|t| DigestKind::from_metadata(&t))
            .filter(|kind| *kind != DigestKind::None)
            .map(|kind| (kind, pkg_id));

        let row = PackageRow {
            key: PackageKey::Metadata { pkg_key },
            name: Name::from_str(&name)?,
            evr: Evr::from_parts(epoch, version, release)?,
            arch: Architecture::from_str(&arch)
                .map_err(|_| ryum_types::Error::UnknownArchitecture(arch.clone()))?,
            summary: summary.unwrap_or_default(),
            description: description.unwrap_or_default(),
            url,
            license,
            size_package: to_size(size_package),
            size_installed: to_size(size_installed),
            location_href,
            digest,
            repo_id: self.id.clone(),
        };

        let source: Weak<dyn DepSource> = self.weak_self.borrow().clone();
        let pkg = Rc::new(Package::new(row, source));
        self.interned.borrow_mut().insert(pkg_key, Rc::clone(&pkg));
        Ok(pkg)
    }
}

impl DepSource for SqliteRepo {
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
                &self.id, name, flags, epoch, version, release,
            )?);
        }
        Ok(deps)
    }

    fn load_files(&self, key: &PackageKey) -> Result<Vec<String>, Error> {
        if !self.has_filelists {
            let mut stmt = self
                .conn
                .prepare("SELECT name FROM files WHERE pkgKey = ?1")
                .map_err(|e| self.database_error(e))?;
            let rows = stmt
                .query_map([key.pkg_key()], |row| row.get(0))
                .map_err(|e| self.database_error(e))?;
            return rows
                .collect::<Result<Vec<String>, _>>()
                .map_err(|e| self.database_error(e));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT dirname, filenames FROM filelists.filelist WHERE pkgKey = ?1")
            .map_err(|e| self.database_error(e))?;
        let rows = stmt
            .query_map([key.pkg_key()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| self.database_error(e))?;

        let mut files = Vec::new();
        for row in rows {
            let (dirname, filenames) = row.map_err(|e| self.database_error(e))?;
            for filename in filenames.split('/').filter(|f| !f.is_empty()) {
                if dirname.ends_with('/') {
                    files.push(format!("{dirname}{filename}"));
                } else {
                    files.push(format!("{dirname}/{filename}"));
                }
            }
        }
        Ok(files)
    }
}

impl PackageQuery for Rc<SqliteRepo> {
    fn search(&self, query: &Query) -> Result<PackageIter, Error> {
        let keys = self.candidate_keys(query)?;
        Ok(PackageIter::Sqlite(SqliteIter {
            repo: Rc::clone(self),
            keys,
            query: query.clone(),
            seen: HashSet::new(),
        }))
    }
}

/// Iterator over one available repository's query results.
///
/// Deduplicates by the (name, epoch, version, release, arch) tuple.
#[derive(Debug)]
pub struct SqliteIter {
    repo: Rc<SqliteRepo>,
    keys: VecDeque<i64>,
    query: Query,
    seen: HashSet<String>,
}

impl Iterator for SqliteIter {
    type Item = Result<Rc<Package>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pkg_key) = self.keys.pop_front() {
            let pkg = match self.repo.materialize(pkg_key) {
                Ok(pkg) => pkg,
                Err(error) => return Some(Err(error)),
            };

            if !self.seen.insert(pkg.nevra().to_string()) {
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
