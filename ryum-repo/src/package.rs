use std::fmt;
use std::rc::Weak;

use once_cell::unsync::OnceCell;
use ryum_types::Architecture;
use ryum_types::Dependency;
use ryum_types::DependencySense;
use ryum_types::DigestKind;
use ryum_types::Epoch;
use ryum_types::Evr;
use ryum_types::Name;
use ryum_types::Nevra;
use ryum_types::PackageId;

use crate::Error;

/// The backend-specific identity of a package within its repository.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PackageKey {
    /// A package in the installed-package database, keyed by its row and
    /// its opaque 16-byte header id.
    Rpmdb {
        /// The database row key.
        pkg_key: i64,
        /// The 16-byte header id.
        id: PackageId,
    },
    /// A package in an available repository's metadata database, keyed
    /// by its row.
    Metadata {
        /// The database row key.
        pkg_key: i64,
    },
}

impl PackageKey {
    /// Return the database row key.
    pub(crate) fn pkg_key(&self) -> i64 {
        match self {
            PackageKey::Rpmdb { pkg_key, .. } | PackageKey::Metadata { pkg_key } => *pkg_key,
        }
    }
}

/// The kind of a package's dependency list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DependencyKind {
    /// Capabilities the package offers.
    Provides,
    /// Capabilities the package needs.
    Requires,
    /// Capabilities whose presence forbids co-installation.
    Conflicts,
    /// Package names this package supersedes.
    Obsoletes,
}

impl DependencyKind {
    /// The dependency table holding this kind.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            DependencyKind::Provides => "provides",
            DependencyKind::Requires => "requires",
            DependencyKind::Conflicts => "conflicts",
            DependencyKind::Obsoletes => "obsoletes",
        }
    }
}

/// The seam through which packages lazily load their dependency and file
/// lists from the backend that produced them.
pub(crate) trait DepSource {
    fn load_dependencies(
        &self,
        key: &PackageKey,
        kind: DependencyKind,
    ) -> Result<Vec<Dependency>, Error>;

    fn load_files(&self, key: &PackageKey) -> Result<Vec<String>, Error>;
}

/// Build a [`Dependency`] from the split columns of a dependency table.
pub(crate) fn dependency_from_row(
    repo_id: &str,
    name: String,
    flags: Option<String>,
    epoch: Option<String>,
    version: Option<String>,
    release: Option<String>,
) -> Result<Dependency, Error> {
    let sense = DependencySense::from_flags(flags.as_deref())?;

    let evr = if sense == DependencySense::None {
        None
    } else {
        let version = version.ok_or_else(|| Error::InvalidRow {
            repo_id: repo_id.to_string(),
            detail: format!("versioned dependency {name} without a version"),
        })?;
        let epoch = epoch.map(|e| e.parse::<Epoch>()).transpose()?;
        Some(Evr::from_parts(epoch, version, release)?)
    };

    Ok(Dependency::new(name, sense, evr))
}

/// The scalar package columns a backend materializes from one row.
pub(crate) struct PackageRow {
    pub key: PackageKey,
    pub name: Name,
    pub evr: Evr,
    pub arch: Architecture,
    pub summary: String,
    pub description: String,
    pub url: Option<String>,
    pub license: Option<String>,
    pub size_package: u64,
    pub size_installed: u64,
    pub location_href: Option<String>,
    pub digest: Option<(DigestKind, String)>,
    pub repo_id: String,
}

/// A shared package handle
///
/// Packages are created by their repository on first sight and cached
/// there: looking the same package up twice yields the same
/// reference-counted entity, so membership reasoning by pointer identity
/// is sound. The repository back-edge is weak; a package that outlives
/// its repository can no longer load its lazy fields.
///
/// Scalar attributes are materialized eagerly. The dependency lists and
/// the file list are loaded on first access through the originating
/// backend.
pub struct Package {
    row: PackageRow,
    source: Weak<dyn DepSource>,
    provides: OnceCell<Vec<Dependency>>,
    requires: OnceCell<Vec<Dependency>>,
    conflicts: OnceCell<Vec<Dependency>>,
    obsoletes: OnceCell<Vec<Dependency>>,
    files: OnceCell<Vec<String>>,
}

impl Package {
    pub(crate) fn new(row: PackageRow, source: Weak<dyn DepSource>) -> Self {
        Package {
            row,
            source,
            provides: OnceCell::new(),
            requires: OnceCell::new(),
            conflicts: OnceCell::new(),
            obsoletes: OnceCell::new(),
            files: OnceCell::new(),
        }
    }

    /// Return the package's identity within its repository
    pub fn key(&self) -> &PackageKey {
        &self.row.key
    }

    /// Return the 16-byte header id, for installed packages
    pub fn package_id(&self) -> Option<PackageId> {
        match self.row.key {
            PackageKey::Rpmdb { id, .. } => Some(id),
            PackageKey::Metadata { .. } => None,
        }
    }

    /// Return the package's (name, epoch, version, release, arch) tuple
    pub fn nevra(&self) -> Nevra {
        Nevra::new(self.row.name.clone(), self.row.evr.clone(), self.row.arch)
    }

    /// Return the package name
    pub fn name(&self) -> &Name {
        &self.row.name
    }

    /// Return the epoch-version-release triple
    pub fn evr(&self) -> &Evr {
        &self.row.evr
    }

    /// Return the architecture
    pub fn arch(&self) -> Architecture {
        self.row.arch
    }

    /// Return the one-line summary
    pub fn summary(&self) -> &str {
        &self.row.summary
    }

    /// Return the long description
    pub fn description(&self) -> &str {
        &self.row.description
    }

    /// Return the upstream URL
    pub fn url(&self) -> Option<&str> {
        self.row.url.as_deref()
    }

    /// Return the license
    pub fn license(&self) -> Option<&str> {
        self.row.license.as_deref()
    }

    /// Return the download size in bytes
    pub fn size_package(&self) -> u64 {
        self.row.size_package
    }

    /// Return the installed size in bytes
    pub fn size_installed(&self) -> u64 {
        self.row.size_installed
    }

    /// Return the package path relative to its repository's base URL
    ///
    /// Installed packages have no location; they cannot be downloaded.
    pub fn location_href(&self) -> Option<&str> {
        self.row.location_href.as_deref()
    }

    /// Return the digest protecting the package download
    ///
    /// Installed packages carry no digest.
    pub fn digest(&self) -> Option<(DigestKind, &str)> {
        self.row
            .digest
            .as_ref()
            .map(|(kind, digest)| (*kind, digest.as_str()))
    }

    /// Return the id of the originating repository
    pub fn repo_id(&self) -> &str {
        &self.row.repo_id
    }

    fn source(&self) -> Result<std::rc::Rc<dyn DepSource>, Error> {
        self.source.upgrade().ok_or_else(|| Error::RepoClosed {
            repo_id: self.row.repo_id.clone(),
        })
    }

    fn dependencies<'a>(
        &self,
        cell: &'a OnceCell<Vec<Dependency>>,
        kind: DependencyKind,
    ) -> Result<&'a [Dependency], Error> {
        cell.get_or_try_init(|| self.source()?.load_dependencies(&self.row.key, kind))
            .map(Vec::as_slice)
    }

    /// Return the capabilities the package provides
    ///
    /// # Errors
    ///
    /// Returns an error if the originating repository has been closed or
    /// its database fails.
    pub fn provides(&self) -> Result<&[Dependency], Error> {
        self.dependencies(&self.provides, DependencyKind::Provides)
    }

    /// Return the capabilities the package requires
    pub fn requires(&self) -> Result<&[Dependency], Error> {
        self.dependencies(&self.requires, DependencyKind::Requires)
    }

    /// Return the capabilities the package conflicts with
    pub fn conflicts(&self) -> Result<&[Dependency], Error> {
        self.dependencies(&self.conflicts, DependencyKind::Conflicts)
    }

    /// Return the package names the package obsoletes
    pub fn obsoletes(&self) -> Result<&[Dependency], Error> {
        self.dependencies(&self.obsoletes, DependencyKind::Obsoletes)
    }

    /// Return the absolute paths of the package's files
    pub fn files(&self) -> Result<&[String], Error> {
        self.files
            .get_or_try_init(|| self.source()?.load_files(&self.row.key))
            .map(Vec::as_slice)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("nevra", &format_args!("{}", self.nevra()))
            .field("repo_id", &self.row.repo_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nevra())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("foo", None, None, None, None, "foo")]
    #[case("foo", Some("GE"), None, Some("2.0"), None, "foo >= 2.0")]
    #[case("foo", Some("EQ"), Some("1"), Some("2.0"), Some("3"), "foo = 1:2.0-3")]
    fn dependency_from_row_ok(
        #[case] name: &str,
        #[case] flags: Option<&str>,
        #[case] epoch: Option<&str>,
        #[case] version: Option<&str>,
        #[case] release: Option<&str>,
        #[case] expected: &str,
    ) {
        let dep = dependency_from_row(
            "base",
            name.to_string(),
            flags.map(String::from),
            epoch.map(String::from),
            version.map(String::from),
            release.map(String::from),
        )
        .unwrap();
        assert_eq!(Dependency::from_str(expected).unwrap(), dep);
    }

    #[test]
    fn dependency_from_row_versioned_without_version() {
        let result = dependency_from_row("base", "foo".to_string(), Some("GE".to_string()), None, None, None);
        assert!(matches!(result, Err(Error::InvalidRow { .. })));
    }
}
