//! A named collection of available repositories under one query surface.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;

use crate::Error;
use crate::Package;
use crate::PackageIter;
use crate::PackageQuery;
use crate::Query;
use crate::SqliteRepo;

/// A named collection of available repositories
///
/// Repositories are keyed by id; iteration over the union is in id
/// order, which keeps query results deterministic across runs for the
/// same inputs. Cloning a set clones the map of shared handles, not the
/// repositories themselves.
#[derive(Clone, Debug, Default)]
pub struct RepoSet {
    repos: BTreeMap<String, Rc<SqliteRepo>>,
}

impl RepoSet {
    /// Create an empty RepoSet
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository to the set
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRepo`] if a repository with the same id
    /// is already present.
    pub fn add(&mut self, repo: Rc<SqliteRepo>) -> Result<(), Error> {
        let id = repo.id().to_string();
        if self.repos.contains_key(&id) {
            return Err(Error::DuplicateRepo { repo_id: id });
        }

        self.repos.insert(id, repo);
        Ok(())
    }

    /// Return the repository with the given id
    pub fn get(&self, id: &str) -> Option<&Rc<SqliteRepo>> {
        self.repos.get(id)
    }

    /// Enable the repository with the given id
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepo`] if no such repository is in the
    /// set.
    pub fn enable(&self, id: &str) -> Result<(), Error> {
        self.set_enabled(id, true)
    }

    /// Disable the repository with the given id
    ///
    /// Disabled repositories are skipped by the union iterator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepo`] if no such repository is in the
    /// set.
    pub fn disable(&self, id: &str) -> Result<(), Error> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), Error> {
        let repo = self.repos.get(id).ok_or_else(|| Error::UnknownRepo {
            repo_id: id.to_string(),
        })?;
        repo.set_enabled(enabled);
        Ok(())
    }

    /// Return the number of repositories in the set
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Returns `true` if the set holds no repositories
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Iterate over the repositories in id order
    pub fn repos(&self) -> impl Iterator<Item = &Rc<SqliteRepo>> {
        self.repos.values()
    }
}

impl PackageQuery for RepoSet {
    fn search(&self, query: &Query) -> Result<PackageIter, Error> {
        Ok(PackageIter::Set(SetIter {
            repos: self.repos.values().cloned().collect(),
            query: query.clone(),
            next_repo: 0,
            current: None,
        }))
    }
}

/// Iterator over the union of a repository set's query results
///
/// Lazily advances the current repository's iterator; on exhaustion the
/// next enabled repository is queried with the same arguments. Disabled
/// repositories are skipped at advance time.
#[derive(Debug)]
pub struct SetIter {
    repos: Vec<Rc<SqliteRepo>>,
    query: Query,
    next_repo: usize,
    current: Option<Box<PackageIter>>,
}

impl Iterator for SetIter {
    type Item = Result<Rc<Package>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(iter) = &mut self.current {
                if let Some(item) = iter.next() {
                    return Some(item);
                }
                self.current = None;
            }

            let repo = loop {
                let repo = self.repos.get(self.next_repo)?;
                self.next_repo += 1;
                if repo.enabled() {
                    break repo;
                }
            };

            debug!("union query moving on to repo '{}'", repo.id());
            match repo.search(&self.query) {
                Ok(iter) => self.current = Some(Box::new(iter)),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
