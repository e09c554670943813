use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use rand::Rng;

use crate::Error;

/// One mirror of a repository.
#[derive(Clone, Debug)]
struct Mirror {
    url: String,
    bad: bool,
}

/// An ordered list of mirror base URLs with bad-mirror tracking
///
/// Mirrors marked bad stay bad for the lifetime of the list; the flag is
/// process-local and never persisted.
///
/// ## Examples
/// ```
/// use ryum_download::MirrorList;
///
/// let mut mirrors = MirrorList::from_urls([
///     "http://mirror-a.example.org/fedora".to_string(),
///     "http://mirror-b.example.org/fedora".to_string(),
/// ]);
///
/// let picked = mirrors.pick_random().unwrap().to_string();
/// mirrors.mark_bad(&picked);
/// assert!(!mirrors.all_bad());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MirrorList {
    mirrors: Vec<Mirror>,
}

impl MirrorList {
    /// Create a MirrorList from base URLs
    pub fn from_urls(urls: impl IntoIterator<Item = String>) -> Self {
        MirrorList {
            mirrors: urls
                .into_iter()
                .map(|url| Mirror { url, bad: false })
                .collect(),
        }
    }

    /// Create a MirrorList from a cached mirrorlist file
    ///
    /// The file carries one base URL per line; blank lines and lines
    /// starting with `#` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::IoPath {
            path: path.to_path_buf(),
            context: "opening the mirrorlist".to_string(),
            source,
        })?;

        let mut urls = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| Error::IoPath {
                path: path.to_path_buf(),
                context: "reading the mirrorlist".to_string(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            urls.push(line.to_string());
        }

        Ok(Self::from_urls(urls))
    }

    /// Return a uniformly random mirror URL whose bad-flag is clear
    ///
    /// Returns `None` when every mirror is marked bad (or the list is
    /// empty).
    pub fn pick_random(&self) -> Option<&str> {
        let good: Vec<&Mirror> = self.mirrors.iter().filter(|m| !m.bad).collect();
        if good.is_empty() {
            return None;
        }

        let index = rand::rng().random_range(0..good.len());
        Some(&good[index].url)
    }

    /// Mark the mirror with the given URL as bad
    pub fn mark_bad(&mut self, url: &str) {
        for mirror in &mut self.mirrors {
            if mirror.url == url {
                debug!("marking mirror {url} as bad");
                mirror.bad = true;
            }
        }
    }

    /// Returns `true` if the mirror with the given URL is marked bad
    pub fn is_bad(&self, url: &str) -> bool {
        self.mirrors.iter().any(|m| m.url == url && m.bad)
    }

    /// Return the number of mirrors in the list
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    /// Returns `true` if the list holds no mirrors
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Returns `true` if no usable mirror is left
    pub fn all_bad(&self) -> bool {
        self.mirrors.iter().all(|m| m.bad)
    }
}
