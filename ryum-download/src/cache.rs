use std::fs::create_dir_all;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;

/// The default cache root.
pub const DEFAULT_CACHE_ROOT: &str = "/var/cache/yum";

/// Return the basename of a repo-relative location href
///
/// ## Examples
/// ```
/// use ryum_download::href_basename;
///
/// assert_eq!("hello-1.0-1.x86_64.rpm", href_basename("Packages/h/hello-1.0-1.x86_64.rpm"));
/// assert_eq!("repomd.xml", href_basename("repomd.xml"));
/// ```
pub fn href_basename(href: &str) -> &str {
    match href.rsplit_once('/') {
        Some((_, basename)) => basename,
        None => href,
    }
}

/// The on-disk layout of the download cache
///
/// Each repository gets a subdirectory of the cache root holding its
/// metadata files directly, full packages under `packages/` and delta
/// files under `deltas/`. In-flight downloads live next to their final
/// path with a `.tmp` suffix and are renamed into place after digest
/// verification.
///
/// ## Examples
/// ```
/// use std::path::PathBuf;
/// use ryum_download::CacheLayout;
///
/// let cache = CacheLayout::new("/var/cache/yum");
/// assert_eq!(
///     PathBuf::from("/var/cache/yum/base/packages/hello-1.0-1.x86_64.rpm"),
///     cache.package_path("base", "Packages/h/hello-1.0-1.x86_64.rpm"),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct CacheLayout {
    root: PathBuf,
}

impl Default for CacheLayout {
    /// Create a CacheLayout rooted at [`DEFAULT_CACHE_ROOT`].
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ROOT)
    }
}

impl CacheLayout {
    /// Create a CacheLayout rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheLayout { root: root.into() }
    }

    /// Return the cache root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the directory holding a repository's cached files
    pub fn repo_dir(&self, repo_id: &str) -> PathBuf {
        self.root.join(repo_id)
    }

    /// Return the directory holding a repository's repodata manifest
    pub fn repodata_dir(&self, repo_id: &str) -> PathBuf {
        self.repo_dir(repo_id).join("repodata")
    }

    /// Return the directory holding a repository's downloaded packages
    pub fn packages_dir(&self, repo_id: &str) -> PathBuf {
        self.repo_dir(repo_id).join("packages")
    }

    /// Return the directory holding a repository's downloaded deltas
    pub fn deltas_dir(&self, repo_id: &str) -> PathBuf {
        self.repo_dir(repo_id).join("deltas")
    }

    /// Return the local path of a metadata file named by its location
    /// href
    pub fn metadata_path(&self, repo_id: &str, href: &str) -> PathBuf {
        self.repo_dir(repo_id).join(href_basename(href))
    }

    /// Return the local path of a package named by its location href
    pub fn package_path(&self, repo_id: &str, location_href: &str) -> PathBuf {
        self.packages_dir(repo_id).join(href_basename(location_href))
    }

    /// Return the local path of a delta named by its location href
    pub fn delta_path(&self, repo_id: &str, location_href: &str) -> PathBuf {
        self.deltas_dir(repo_id).join(href_basename(location_href))
    }

    /// Return the local path of a repository's cached mirrorlist
    pub fn mirrorlist_path(&self, repo_id: &str) -> PathBuf {
        self.repo_dir(repo_id).join("mirrorlist.txt")
    }

    /// Return the local path of a repository's cached metalink
    pub fn metalink_path(&self, repo_id: &str) -> PathBuf {
        self.repo_dir(repo_id).join("metalink.xml")
    }
}

/// Return the in-flight path of a download destination
///
/// ## Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use ryum_download::CacheLayout;
///
/// assert_eq!(
///     PathBuf::from("/tmp/repomd.xml.tmp"),
///     ryum_download::tmp_path(Path::new("/tmp/repomd.xml")),
/// );
/// ```
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Create a directory (and its parents) for cached downloads
///
/// On unix the directory is created with mode `0755`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), Error> {
    create_dir_all(path).map_err(|source| Error::IoPath {
        path: path.to_path_buf(),
        context: "creating the cache directory".to_string(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(
            |source| Error::IoPath {
                path: path.to_path_buf(),
                context: "setting cache directory permissions".to_string(),
                source,
            },
        )?;
    }

    Ok(())
}
