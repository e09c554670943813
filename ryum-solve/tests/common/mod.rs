//! Fixture databases for resolver tests.

use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use rusqlite::Connection;
use rusqlite::params;
use ryum_repo::RepoConfig;
use ryum_repo::RepoSet;
use ryum_repo::RpmdbRepo;
use ryum_repo::SqliteRepo;
use ryum_repo::schema;
use ryum_types::Dependency;
use ryum_types::Evr;

/// One package to be written into a fixture database.
#[derive(Clone, Debug)]
pub struct FixturePackage {
    pub name: String,
    pub evr: String,
    pub arch: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub conflicts: Vec<String>,
    pub files: Vec<String>,
}

impl FixturePackage {
    pub fn new(name: &str, evr: &str, arch: &str) -> Self {
        FixturePackage {
            name: name.to_string(),
            evr: evr.to_string(),
            arch: arch.to_string(),
            provides: Vec::new(),
            requires: Vec::new(),
            conflicts: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn provides(mut self, deps: &[&str]) -> Self {
        self.provides.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn requires(mut self, deps: &[&str]) -> Self {
        self.requires.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn conflicts(mut self, deps: &[&str]) -> Self {
        self.conflicts.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.files.extend(files.iter().map(|f| f.to_string()));
        self
    }

    /// The self-provide every real package carries.
    fn self_provide(&self) -> String {
        format!("{} = {}", self.name, self.evr)
    }
}

fn evr_columns(evr: &str) -> (Option<String>, String, Option<String>) {
    let evr = Evr::from_str(evr).unwrap();
    (
        evr.epoch().map(|e| e.to_string()),
        evr.version().to_string(),
        evr.release().map(|r| r.to_string()),
    )
}

fn insert_deps(conn: &Connection, table: &str, pkg_key: i64, deps: &[String]) {
    for dep in deps {
        let dep = Dependency::from_str(dep).unwrap();
        let (epoch, version, release) = match &dep.evr {
            Some(evr) => {
                let (e, v, r) = evr_columns(&evr.to_string());
                (e, Some(v), r)
            }
            None => (None, None, None),
        };
        conn.execute(
            &format!(
                "INSERT INTO {table} (pkgKey, name, flags, epoch, version, release) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![pkg_key, dep.name, dep.sense.as_flags(), epoch, version, release],
        )
        .unwrap();
    }
}

/// Create and open an installed-package database in `dir`.
pub fn open_installed(dir: &Path, pkgs: &[FixturePackage]) -> Rc<RpmdbRepo> {
    let path = dir.join("installed.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(schema::INSTALLED_DB).unwrap();

    for (index, pkg) in pkgs.iter().enumerate() {
        let pkg_key = index as i64 + 1;
        let mut pkg_id = [0u8; 16];
        pkg_id[0] = pkg_key as u8;
        let (epoch, version, release) = evr_columns(&pkg.evr);

        conn.execute(
            "INSERT INTO packages (pkgKey, pkgId, name, epoch, version, release, arch, \
             summary, description, url, license, size_installed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                pkg_key,
                pkg_id.as_slice(),
                pkg.name,
                epoch,
                version,
                release,
                pkg.arch,
                format!("The {} package", pkg.name),
                "",
                Option::<String>::None,
                "MIT",
                4096,
            ],
        )
        .unwrap();

        let mut provides = pkg.provides.clone();
        provides.push(pkg.self_provide());
        insert_deps(&conn, "provides", pkg_key, &provides);
        insert_deps(&conn, "requires", pkg_key, &pkg.requires);
        insert_deps(&conn, "conflicts", pkg_key, &pkg.conflicts);

        for file in &pkg.files {
            conn.execute(
                "INSERT INTO files (pkgKey, name) VALUES (?1, ?2)",
                params![pkg_key, file],
            )
            .unwrap();
        }
    }

    drop(conn);
    RpmdbRepo::open(&path).unwrap()
}

/// Create and open an available repository named `id` in `dir`.
pub fn open_repo(dir: &Path, id: &str, pkgs: &[FixturePackage]) -> Rc<SqliteRepo> {
    let primary = dir.join(format!("{id}-primary.sqlite"));
    let conn = Connection::open(&primary).unwrap();
    conn.execute_batch(schema::PRIMARY_DB).unwrap();

    for (index, pkg) in pkgs.iter().enumerate() {
        let pkg_key = index as i64 + 1;
        let (epoch, version, release) = evr_columns(&pkg.evr);

        conn.execute(
            "INSERT INTO packages (pkgKey, pkgId, name, arch, version, epoch, release, \
             summary, description, url, rpm_license, size_package, size_installed, \
             location_href, checksum_type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                pkg_key,
                format!("{:064x}", pkg_key),
                pkg.name,
                pkg.arch,
                version,
                epoch,
                release,
                format!("The {} package", pkg.name),
                "",
                Option::<String>::None,
                "MIT",
                1024,
                4096,
                format!("Packages/{}-{}.{}.rpm", pkg.name, pkg.evr, pkg.arch),
                "sha256",
            ],
        )
        .unwrap();

        let mut provides = pkg.provides.clone();
        provides.push(pkg.self_provide());
        insert_deps(&conn, "provides", pkg_key, &provides);
        insert_deps(&conn, "requires", pkg_key, &pkg.requires);
        insert_deps(&conn, "conflicts", pkg_key, &pkg.conflicts);

        for file in &pkg.files {
            conn.execute(
                "INSERT INTO files (pkgKey, name) VALUES (?1, ?2)",
                params![pkg_key, file],
            )
            .unwrap();
        }
    }

    drop(conn);
    SqliteRepo::open(RepoConfig {
        id: id.to_string(),
        name: format!("Test repository {id}"),
        enabled: true,
        baseurl: Some(format!("http://mirror.example.org/{id}")),
        mirrorlist: None,
        primary_db: primary,
        filelists_db: None,
        delta_metadata: None,
    })
    .unwrap()
}

/// Build a RepoSet from repositories.
pub fn repo_set(repos: impl IntoIterator<Item = Rc<SqliteRepo>>) -> RepoSet {
    let mut set = RepoSet::new();
    for repo in repos {
        set.add(repo).unwrap();
    }
    set
}
