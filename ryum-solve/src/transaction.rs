use std::fmt;
use std::rc::Rc;

use log::debug;
use ryum_repo::Package;
use ryum_repo::PackageQuery;
use ryum_repo::RepoSet;
use ryum_repo::RpmdbRepo;
use ryum_types::Architecture;
use ryum_types::Dependency;

use crate::Error;

/// The result of adding a package to a membership set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddResult {
    /// The package was inserted.
    Added,
    /// The same package was already present; the set is unchanged.
    AlreadyPresent,
}

/// Why a package could not be resolved.
#[derive(Clone, Debug)]
pub enum UnresolvedReason {
    /// No installed package, transaction peer, or available package
    /// satisfies the requirement.
    MissingRequires(Dependency),
    /// An installed package that is not being removed conflicts with
    /// the package.
    ConflictsInstalled(Rc<Package>),
    /// Another transaction member conflicts with the package.
    ConflictsPeer(Rc<Package>),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MissingRequires(dep) => write!(f, "nothing provides {dep}"),
            UnresolvedReason::ConflictsInstalled(pkg) => {
                write!(f, "conflicts with installed {pkg}")
            }
            UnresolvedReason::ConflictsPeer(pkg) => {
                write!(f, "conflicts with {pkg} from the transaction")
            }
        }
    }
}

/// One package that failed resolution, with its reason.
#[derive(Clone, Debug)]
pub struct Unresolved {
    /// The package that failed to resolve.
    pub package: Rc<Package>,
    /// Why resolution failed.
    pub reason: UnresolvedReason,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.package, self.reason)
    }
}

/// One member of the update set
///
/// Pairs the incoming package with the installed package it replaces.
/// Unpaired members (added by the caller, not yet resolved) have no
/// replacement.
#[derive(Clone, Debug)]
pub struct UpdateMember {
    pub(crate) pkg: Rc<Package>,
    pub(crate) replaces: Option<Rc<Package>>,
}

impl UpdateMember {
    /// Return the incoming package
    pub fn package(&self) -> &Rc<Package> {
        &self.pkg
    }

    /// Return the installed package being replaced
    pub fn replaces(&self) -> Option<&Rc<Package>> {
        self.replaces.as_ref()
    }
}

/// The progress callback invoked at resolver pass boundaries, with the
/// current cycle number.
pub type ResolveProgress = Box<dyn FnMut(usize)>;

/// Returns `true` if `pkg` is in `list` by shared-handle identity.
pub(crate) fn identity_in(list: &[Rc<Package>], pkg: &Rc<Package>) -> bool {
    list.iter().any(|member| Rc::ptr_eq(member, pkg))
}

/// A package transaction under construction
///
/// Collects install, update, and remove intents, then
/// [`resolve`](Transaction::resolve)s them against the installed system
/// and the available repositories. Membership is by shared-handle
/// identity and preserves insertion order; the five sets are pairwise
/// disjoint, and `updated` mirrors the paired members of `update`.
pub struct Transaction {
    pub(crate) rpmdb: Rc<RpmdbRepo>,
    pub(crate) repos: RepoSet,
    pub(crate) host_arch: Architecture,
    pub(crate) install: Vec<Rc<Package>>,
    pub(crate) update: Vec<UpdateMember>,
    pub(crate) updated: Vec<Rc<Package>>,
    pub(crate) remove: Vec<Rc<Package>>,
    pub(crate) unresolved: Vec<Unresolved>,
    pub(crate) progress: Option<ResolveProgress>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("install", &self.install)
            .field("update", &self.update)
            .field("updated", &self.updated)
            .field("remove", &self.remove)
            .field("unresolved", &self.unresolved.len())
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Create an empty transaction over the installed system and the
    /// available repositories
    pub fn new(rpmdb: Rc<RpmdbRepo>, repos: RepoSet) -> Self {
        Transaction {
            rpmdb,
            repos,
            host_arch: Architecture::host(),
            install: Vec::new(),
            update: Vec::new(),
            updated: Vec::new(),
            remove: Vec::new(),
            unresolved: Vec::new(),
            progress: None,
        }
    }

    /// Attach a progress callback invoked at resolver pass boundaries
    pub fn with_progress(mut self, progress: ResolveProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Override the host architecture used for candidate selection and
    /// update pairing
    pub fn with_host_arch(mut self, host_arch: Architecture) -> Self {
        self.host_arch = host_arch;
        self
    }

    /// Add a package to the install set
    ///
    /// Packages already in `install` or `update` (by identity) are not
    /// added again.
    pub fn add_install(&mut self, pkg: Rc<Package>) -> AddResult {
        if identity_in(&self.install, &pkg)
            || self.update.iter().any(|m| Rc::ptr_eq(&m.pkg, &pkg))
        {
            debug!("not adding already added {pkg} for install");
            return AddResult::AlreadyPresent;
        }

        debug!("adding {pkg} for install");
        self.install.push(pkg);
        AddResult::Added
    }

    /// Add a package to the update set
    ///
    /// The resolver later pairs it with the installed package it
    /// replaces, or demotes it to a plain install if there is none.
    pub fn add_update(&mut self, pkg: Rc<Package>) {
        debug!("adding {pkg} for update");
        self.update.push(UpdateMember {
            pkg,
            replaces: None,
        });
    }

    /// Add a package to the remove set
    pub fn add_remove(&mut self, pkg: Rc<Package>) -> AddResult {
        if identity_in(&self.remove, &pkg) {
            debug!("not adding already added {pkg} for removal");
            return AddResult::AlreadyPresent;
        }

        debug!("adding {pkg} for removal");
        self.remove.push(pkg);
        AddResult::Added
    }

    /// Seed an install intent from a capability
    ///
    /// Searches the available repositories for providers of `dep`,
    /// picks the best candidate (EVR first, then architecture
    /// preference, then repository id) and adds it to the install set.
    /// Returns the chosen package, or `None` when nothing provides the
    /// capability.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository query fails.
    pub fn install_capability(&mut self, dep: &Dependency) -> Result<Option<Rc<Package>>, Error> {
        match self.best_available(dep)? {
            Some(best) => {
                self.add_install(Rc::clone(&best));
                Ok(Some(best))
            }
            None => Ok(None),
        }
    }

    /// Seed an update intent from a capability
    ///
    /// Like [`install_capability`](Transaction::install_capability),
    /// but the chosen package joins the update set; the resolver pairs
    /// it with the installed package it replaces (or demotes it to an
    /// install when there is none).
    ///
    /// # Errors
    ///
    /// Returns an error if a repository query fails.
    pub fn update_capability(&mut self, dep: &Dependency) -> Result<Option<Rc<Package>>, Error> {
        match self.best_available(dep)? {
            Some(best) => {
                self.add_update(Rc::clone(&best));
                Ok(Some(best))
            }
            None => Ok(None),
        }
    }

    /// Seed a remove intent from a capability
    ///
    /// Searches the installed system for a provider of `dep` and adds
    /// the first hit to the remove set. Returns the chosen package, or
    /// `None` when nothing installed provides the capability.
    ///
    /// # Errors
    ///
    /// Returns an error if the installed-system query fails.
    pub fn remove_capability(&mut self, dep: &Dependency) -> Result<Option<Rc<Package>>, Error> {
        let mut hits = self.rpmdb.search_provides(dep)?;
        match hits.next().transpose()? {
            Some(hit) => {
                self.add_remove(Rc::clone(&hit));
                Ok(Some(hit))
            }
            None => Ok(None),
        }
    }

    fn best_available(&self, dep: &Dependency) -> Result<Option<Rc<Package>>, Error> {
        let mut candidates = Vec::new();
        for hit in self.repos.search_provides(dep)? {
            candidates.push(hit?);
        }
        if dep.is_file() {
            for hit in self.repos.search_files(&dep.name)? {
                candidates.push(hit?);
            }
        }

        Ok(crate::select::best_candidate(candidates, self.host_arch))
    }

    /// Return the packages to newly install
    pub fn install(&self) -> &[Rc<Package>] {
        &self.install
    }

    /// Return the packages to install in place of installed ones
    pub fn update(&self) -> &[UpdateMember] {
        &self.update
    }

    /// Return the installed packages being replaced by `update` members
    pub fn updated(&self) -> &[Rc<Package>] {
        &self.updated
    }

    /// Return the packages to erase
    pub fn remove(&self) -> &[Rc<Package>] {
        &self.remove
    }

    /// Return the packages that failed resolution
    pub fn unresolved(&self) -> &[Unresolved] {
        &self.unresolved
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.install.is_empty() {
            writeln!(f, "Installing:")?;
            for pkg in &self.install {
                writeln!(f, "  {pkg} ({})", pkg.repo_id())?;
            }
        }
        if !self.update.is_empty() {
            writeln!(f, "Updating:")?;
            for member in &self.update {
                match &member.replaces {
                    Some(old) => writeln!(
                        f,
                        "  {} ({}) replaces {old}",
                        member.pkg,
                        member.pkg.repo_id()
                    )?,
                    None => writeln!(f, "  {} ({})", member.pkg, member.pkg.repo_id())?,
                }
            }
        }
        if !self.remove.is_empty() {
            writeln!(f, "Removing:")?;
            for pkg in &self.remove {
                writeln!(f, "  {pkg}")?;
            }
        }
        if !self.unresolved.is_empty() {
            writeln!(f, "Unresolved:")?;
            for unresolved in &self.unresolved {
                writeln!(f, "  {unresolved}")?;
            }
        }
        Ok(())
    }
}
