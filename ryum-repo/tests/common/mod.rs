//! Fixture databases for backend tests.

use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use rusqlite::Connection;
use rusqlite::params;
use ryum_repo::RepoConfig;
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
    pub summary: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub conflicts: Vec<String>,
    pub obsoletes: Vec<String>,
    pub files: Vec<String>,
}

impl FixturePackage {
    pub fn new(name: &str, evr: &str, arch: &str) -> Self {
        FixturePackage {
            name: name.to_string(),
            evr: evr.to_string(),
            arch: arch.to_string(),
            summary: format!("The {name} package"),
            provides: Vec::new(),
            requires: Vec::new(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
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

    pub fn obsoletes(mut self, deps: &[&str]) -> Self {
        self.obsoletes.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.files.extend(files.iter().map(|f| f.to_string()));
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
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

/// Write an installed-package database holding the given packages.
pub fn create_installed_db(path: &Path, pkgs: &[FixturePackage]) {
    let conn = Connection::open(path).unwrap();
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
                pkg.summary,
                format!("Description of {}", pkg.name),
                format!("https://example.org/{}", pkg.name),
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
        insert_deps(&conn, "obsoletes", pkg_key, &pkg.obsoletes);

        for file in &pkg.files {
            conn.execute(
                "INSERT INTO files (pkgKey, name) VALUES (?1, ?2)",
                params![pkg_key, file],
            )
            .unwrap();
        }
    }
}

/// Write a primary metadata database holding the given packages.
pub fn create_primary_db(path: &Path, pkgs: &[FixturePackage]) {
    let conn = Connection::open(path).unwrap();
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
                pkg.summary,
                format!("Description of {}", pkg.name),
                format!("https://example.org/{}", pkg.name),
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
        insert_deps(&conn, "obsoletes", pkg_key, &pkg.obsoletes);
    }
}

/// Write a filelists metadata database holding the given packages'
/// files.
pub fn create_filelists_db(path: &Path, pkgs: &[FixturePackage]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(schema::FILELISTS_DB).unwrap();

    for (index, pkg) in pkgs.iter().enumerate() {
        let pkg_key = index as i64 + 1;
        conn.execute(
            "INSERT INTO packages (pkgKey, pkgId) VALUES (?1, ?2)",
            params![pkg_key, format!("{:064x}", pkg_key)],
        )
        .unwrap();

        for file in &pkg.files {
            let (dirname, basename) = match file.rsplit_once('/') {
                Some(("", basename)) => ("/".to_string(), basename),
                Some((dirname, basename)) => (dirname.to_string(), basename),
                None => continue,
            };
            conn.execute(
                "INSERT INTO filelist (pkgKey, dirname, filenames, filetypes) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![pkg_key, dirname, basename, "f"],
            )
            .unwrap();
        }
    }
}

/// Create and open an installed-package database in `dir`.
pub fn open_installed(dir: &Path, pkgs: &[FixturePackage]) -> Rc<RpmdbRepo> {
    let path = dir.join("installed.sqlite");
    create_installed_db(&path, pkgs);
    RpmdbRepo::open(&path).unwrap()
}

/// Create and open an available repository named `id` in `dir`.
pub fn open_repo(dir: &Path, id: &str, enabled: bool, pkgs: &[FixturePackage]) -> Rc<SqliteRepo> {
    let primary = dir.join(format!("{id}-primary.sqlite"));
    let filelists = dir.join(format!("{id}-filelists.sqlite"));
    create_primary_db(&primary, pkgs);
    create_filelists_db(&filelists, pkgs);

    SqliteRepo::open(RepoConfig {
        id: id.to_string(),
        name: format!("Test repository {id}"),
        enabled,
        baseurl: Some(format!("http://mirror.example.org/{id}")),
        mirrorlist: None,
        primary_db: primary,
        filelists_db: Some(filelists),
        delta_metadata: None,
    })
    .unwrap()
}

/// A RepoConfig pointing at a nonexistent primary database.
pub fn missing_repo_config(dir: &Path, id: &str) -> RepoConfig {
    RepoConfig {
        id: id.to_string(),
        name: format!("Test repository {id}"),
        enabled: true,
        baseurl: None,
        mirrorlist: None,
        primary_db: PathBuf::from(dir.join("does-not-exist.sqlite")),
        filelists_db: None,
        delta_metadata: None,
    }
}
