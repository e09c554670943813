//! The table layouts of the databases the backends read.
//!
//! The databases themselves are produced by external collaborators: the
//! installed-package index is exported from the system package database,
//! and the per-repository primary/filelists databases are downloaded as
//! part of the repository metadata. The backends only ever read them.
//! The statements here exist so that producers (and tests) agree with
//! the readers on the layout.

/// The installed-package index database read by
/// [`RpmdbRepo`](crate::RpmdbRepo).
///
/// `pkgId` is the opaque 16-byte header identifier. The dependency
/// tables store one capability per row with the sense in `flags`
/// (`EQ`/`LT`/`LE`/`GT`/`GE`, NULL for unversioned) and the version in
/// split `epoch`/`version`/`release` columns. `files` holds one
/// absolute path per row.
pub const INSTALLED_DB: &str = "\
CREATE TABLE packages (
  pkgKey INTEGER PRIMARY KEY,
  pkgId BLOB NOT NULL,
  name TEXT NOT NULL,
  epoch TEXT,
  version TEXT NOT NULL,
  release TEXT,
  arch TEXT NOT NULL,
  summary TEXT,
  description TEXT,
  url TEXT,
  license TEXT,
  size_installed INTEGER
);
CREATE TABLE provides (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE requires (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE conflicts (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE obsoletes (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE files (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL
);
CREATE INDEX packagename ON packages (name);
CREATE INDEX providesname ON provides (name);
CREATE INDEX requiresname ON requires (name);
CREATE INDEX conflictsname ON conflicts (name);
CREATE INDEX obsoletesname ON obsoletes (name);
CREATE INDEX filesname ON files (name);
";

/// The per-repository primary metadata database read by
/// [`SqliteRepo`](crate::SqliteRepo).
///
/// `pkgId` doubles as the package digest (hex, of the kind named by
/// `checksum_type`). `location_href` is the package path relative to the
/// repository base URL. The `files` table only carries the primary
/// subset of the file list; the complete list lives in the filelists
/// database.
pub const PRIMARY_DB: &str = "\
CREATE TABLE packages (
  pkgKey INTEGER PRIMARY KEY,
  pkgId TEXT NOT NULL,
  name TEXT NOT NULL,
  arch TEXT NOT NULL,
  version TEXT NOT NULL,
  epoch TEXT,
  release TEXT,
  summary TEXT,
  description TEXT,
  url TEXT,
  rpm_license TEXT,
  size_package INTEGER,
  size_installed INTEGER,
  location_href TEXT,
  checksum_type TEXT
);
CREATE TABLE provides (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE requires (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE conflicts (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE obsoletes (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL,
  flags TEXT,
  epoch TEXT,
  version TEXT,
  release TEXT
);
CREATE TABLE files (
  pkgKey INTEGER NOT NULL,
  name TEXT NOT NULL
);
CREATE INDEX packagename ON packages (name);
CREATE INDEX providesname ON provides (name);
CREATE INDEX requiresname ON requires (name);
CREATE INDEX conflictsname ON conflicts (name);
CREATE INDEX obsoletesname ON obsoletes (name);
CREATE INDEX filesname ON files (name);
";

/// The per-repository filelists database attached by
/// [`SqliteRepo`](crate::SqliteRepo).
///
/// One row per package directory: `filenames` is the `/`-separated list
/// of entry names below `dirname`.
pub const FILELISTS_DB: &str = "\
CREATE TABLE packages (
  pkgKey INTEGER PRIMARY KEY,
  pkgId TEXT NOT NULL
);
CREATE TABLE filelist (
  pkgKey INTEGER NOT NULL,
  dirname TEXT NOT NULL,
  filenames TEXT NOT NULL,
  filetypes TEXT
);
CREATE INDEX dirnames ON filelist (dirname);
CREATE INDEX keyfile ON filelist (pkgKey);
";
