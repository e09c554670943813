//! The resolver state machine.
//!
//! `resolve` repeats three passes (conflicts, requires, removal
//! cascade) until a full cycle makes no change. Each pass only ever
//! adds members, and the membership sets are bounded by the installed
//! and available package universe, so the loop reaches a fixpoint.

use std::rc::Rc;

use log::debug;
use ryum_repo::Package;
use ryum_repo::PackageIter;
use ryum_repo::PackageQuery;
use ryum_types::Dependency;

use crate::AddResult;
use crate::Error;
use crate::Transaction;
use crate::Unresolved;
use crate::UnresolvedReason;
use crate::select::best_candidate;
use crate::transaction::UpdateMember;
use crate::transaction::identity_in;

/// The offending packages of an unresolvable pass.
type Offenders = Vec<(Rc<Package>, UnresolvedReason)>;

/// The outcome of the requires pass.
enum RequiresOutcome {
    Changed(bool),
    Unresolvable(Rc<Package>, UnresolvedReason),
}

impl Transaction {
    /// Resolve the transaction to a closed, consistent package set
    ///
    /// Drives the conflicts, requires, and removal-cascade passes to a
    /// fixpoint. On success the membership sets describe a transaction
    /// in which every requirement of every incoming package is
    /// satisfied and no conflicts remain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unresolved`] when a requirement cannot be
    /// satisfied or a conflict cannot be avoided; the offending
    /// packages move to [`unresolved`](Transaction::unresolved).
    /// Returns [`Error::Repo`] when a backend query fails.
    pub fn resolve(&mut self) -> Result<(), Error> {
        debug!("resolving transaction");

        self.pair_updates()?;

        let mut cycle = 0;
        loop {
            cycle += 1;
            if let Some(progress) = &mut self.progress {
                progress(cycle);
            }

            if let Some(offenders) = self.conflicts_pass()? {
                self.fail(offenders);
                return Err(Error::Unresolved);
            }

            let mut changed = match self.requires_pass()? {
                RequiresOutcome::Unresolvable(pkg, reason) => {
                    self.fail(vec![(pkg, reason)]);
                    return Err(Error::Unresolved);
                }
                RequiresOutcome::Changed(changed) => changed,
            };

            changed |= self.removal_cascade_pass()?;

            if !changed {
                break;
            }
        }

        debug!("transaction resolved in {cycle} cycles");
        Ok(())
    }

    /// Pair every unpaired update member with the installed package it
    /// replaces; members with no older installed counterpart demote to
    /// plain installs.
    fn pair_updates(&mut self) -> Result<(), Error> {
        let members = std::mem::take(&mut self.update);

        for member in members {
            if member.replaces.is_some() {
                self.update.push(member);
                continue;
            }

            let pkg = member.pkg;
            let mut replaced = None;
            let iter = self.rpmdb.list_by_name(pkg.name())?;
            for hit in iter {
                let hit = hit?;
                if !pkg.arch().is_compatible_with(hit.arch())
                    || pkg.evr().compare(hit.evr()) != std::cmp::Ordering::Greater
                    || identity_in(&self.updated, &hit)
                {
                    continue;
                }
                replaced = Some(hit);
                break;
            }

            match replaced {
                Some(old) => {
                    debug!("update {pkg} replaces installed {old}");
                    self.updated.push(Rc::clone(&old));
                    self.update.push(UpdateMember {
                        pkg,
                        replaces: Some(old),
                    });
                }
                None => {
                    debug!("no installed package for update {pkg}, demoting to install");
                    self.add_install(pkg);
                }
            }
        }

        Ok(())
    }

    /// The packages being brought onto the system, in insertion order.
    fn incoming(&self) -> Vec<Rc<Package>> {
        self.install
            .iter()
            .cloned()
            .chain(self.update.iter().map(|m| Rc::clone(&m.pkg)))
            .collect()
    }

    /// Move the offenders out of their membership sets and into the
    /// unresolved set.
    fn fail(&mut self, offenders: Offenders) {
        for (pkg, reason) in offenders {
            debug!("adding {pkg} to unresolved");

            self.install.retain(|member| !Rc::ptr_eq(member, &pkg));
            let mut dropped_replacements = Vec::new();
            self.update.retain(|member| {
                if Rc::ptr_eq(&member.pkg, &pkg) {
                    if let Some(old) = &member.replaces {
                        dropped_replacements.push(Rc::clone(old));
                    }
                    false
                } else {
                    true
                }
            });
            for old in dropped_replacements {
                self.updated.retain(|member| !Rc::ptr_eq(member, &old));
            }

            self.unresolved.push(Unresolved {
                package: pkg,
                reason,
            });
        }
    }

    /// Returns `true` if any result of `iter` is an installed package
    /// that is not slated for removal.
    fn any_hit_not_removed(&self, iter: PackageIter) -> Result<bool, Error> {
        for hit in iter {
            let hit = hit?;
            if !identity_in(&self.remove, &hit) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The conflicts pass: no incoming package may conflict with a
    /// remaining installed package or a peer.
    ///
    /// Returns the offenders of the first conflict found, or `None`
    /// when the pass is clean.
    fn conflicts_pass(&self) -> Result<Option<Offenders>, Error> {
        for pkg in self.incoming() {
            debug!("checking for installed packages that conflict with {pkg}");

            // an installed package whose conflict matches one of our
            // provides
            for provide in pkg.provides()? {
                let mut hits = self.rpmdb.search_conflicts(provide)?;
                if let Some(hit) = hits.next() {
                    let hit = hit?;
                    debug!("{pkg} conflicted by installed {hit}");
                    return Ok(Some(vec![(
                        Rc::clone(&pkg),
                        UnresolvedReason::ConflictsInstalled(hit),
                    )]));
                }
            }

            // an installed package (not being removed) providing one of
            // our conflicts
            for conflict in pkg.conflicts()? {
                let mut hits = self.rpmdb.search_provides(conflict)?;
                if let Some(hit) = hits.next() {
                    let hit = hit?;
                    if identity_in(&self.remove, &hit) {
                        continue;
                    }
                    debug!("{pkg} conflicts with installed {hit}");
                    return Ok(Some(vec![(
                        Rc::clone(&pkg),
                        UnresolvedReason::ConflictsInstalled(hit),
                    )]));
                }
            }

            // a peer in the transaction providing one of our conflicts
            for conflict in pkg.conflicts()? {
                for peer in self.incoming() {
                    if Rc::ptr_eq(&peer, &pkg) {
                        continue;
                    }
                    if peer
                        .provides()?
                        .iter()
                        .any(|provide| conflict.satisfies(provide))
                    {
                        debug!("{pkg} conflicted by {peer} from the transaction");
                        return Ok(Some(vec![
                            (
                                Rc::clone(&pkg),
                                UnresolvedReason::ConflictsPeer(Rc::clone(&peer)),
                            ),
                            (peer, UnresolvedReason::ConflictsPeer(pkg)),
                        ]));
                    }
                }
            }
        }

        Ok(None)
    }

    /// The requires pass: every requirement of every incoming package
    /// must be satisfied somewhere; missing capabilities pull the best
    /// available candidate into the install set.
    ///
    /// Members added during the pass are themselves visited before the
    /// pass ends.
    fn requires_pass(&mut self) -> Result<RequiresOutcome, Error> {
        let mut changed = false;
        let mut queue = self.incoming();

        let mut index = 0;
        while index < queue.len() {
            let pkg = Rc::clone(&queue[index]);
            index += 1;

            debug!("checking requires for {pkg}");
            for req in pkg.requires()?.to_vec() {
                if self.requirement_met(&pkg, &req)? {
                    continue;
                }

                // pull the best available candidate for the capability
                let mut candidates = Vec::new();
                for hit in self.repos.search_provides(&req)? {
                    candidates.push(hit?);
                }
                if req.is_file() {
                    for hit in self.repos.search_files(&req.name)? {
                        candidates.push(hit?);
                    }
                }

                match best_candidate(candidates, self.host_arch) {
                    Some(best) => {
                        debug!("{req} provided by available {best}");
                        if self.add_install(Rc::clone(&best)) == AddResult::Added {
                            changed = true;
                            queue.push(best);
                        }
                    }
                    None => {
                        debug!("{req} not provided by anything");
                        return Ok(RequiresOutcome::Unresolvable(
                            pkg,
                            UnresolvedReason::MissingRequires(req),
                        ));
                    }
                }
            }
        }

        Ok(RequiresOutcome::Changed(changed))
    }

    /// Returns `true` if a requirement of `pkg` is already satisfied by
    /// the package itself, by an installed package not slated for
    /// removal, or by a transaction peer.
    fn requirement_met(&self, pkg: &Rc<Package>, req: &Dependency) -> Result<bool, Error> {
        // self-provided
        if pkg.provides()?.iter().any(|provide| req.satisfies(provide)) {
            debug!("self-provided requires {req}, skipping");
            return Ok(true);
        }
        if req.is_file() && pkg.files()?.iter().any(|file| *file == req.name) {
            debug!("self-provided file requires {req}, skipping");
            return Ok(true);
        }

        // an installed package not slated for removal
        if self.any_hit_not_removed(self.rpmdb.search_provides(req)?)? {
            return Ok(true);
        }
        if req.is_file() && self.any_hit_not_removed(self.rpmdb.search_files(&req.name)?)? {
            return Ok(true);
        }

        // a peer in the transaction
        for peer in self.incoming() {
            if Rc::ptr_eq(&peer, pkg) {
                continue;
            }
            if peer.provides()?.iter().any(|provide| req.satisfies(provide)) {
                return Ok(true);
            }
            if req.is_file() && peer.files()?.iter().any(|file| *file == req.name) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// The removal-cascade pass: installed packages depending on a
    /// capability or file of a departing package are removed as well.
    ///
    /// Dependent selection matches by name only; the version sense of
    /// the dependent's requirement is not consulted. For a package
    /// replaced by an update, dependents whose requirements are still
    /// satisfied by the replacement stay installed.
    fn removal_cascade_pass(&mut self) -> Result<bool, Error> {
        let mut changed = false;

        let mut index = 0;
        while index < self.remove.len() {
            let pkg = Rc::clone(&self.remove[index]);
            index += 1;
            debug!("checking removal of {pkg}");
            changed |= self.cascade_dependents(&pkg, None)?;
        }

        let replacements: Vec<(Rc<Package>, Rc<Package>)> = self
            .update
            .iter()
            .filter_map(|member| {
                member
                    .replaces
                    .as_ref()
                    .map(|old| (Rc::clone(old), Rc::clone(&member.pkg)))
            })
            .collect();
        for (old, replacement) in replacements {
            debug!("checking dependents of replaced {old}");
            changed |= self.cascade_dependents(&old, Some(&replacement))?;
        }

        Ok(changed)
    }

    /// Remove the installed dependents of every capability and file of
    /// `pkg`.
    fn cascade_dependents(
        &mut self,
        pkg: &Rc<Package>,
        replacement: Option<&Rc<Package>>,
    ) -> Result<bool, Error> {
        let mut changed = false;

        let mut capabilities: Vec<Dependency> = pkg
            .provides()?
            .iter()
            .map(|provide| Dependency::unversioned(&provide.name))
            .collect();
        capabilities.extend(pkg.files()?.iter().map(|file| Dependency::unversioned(file)));

        for capability in capabilities {
            let dependents = self.rpmdb.search_requires(&capability)?;
            for dependent in dependents {
                let dependent = dependent?;
                if identity_in(&self.remove, &dependent)
                    || identity_in(&self.updated, &dependent)
                {
                    continue;
                }

                if let Some(replacement) = replacement {
                    if self.still_satisfied(&dependent, &capability, replacement)? {
                        continue;
                    }
                }

                debug!("removing {dependent}, it depends on {capability}");
                if self.add_remove(dependent) == AddResult::Added {
                    changed = true;
                }
            }
        }

        Ok(changed)
    }

    /// Returns `true` if every requirement of `dependent` on the given
    /// capability name is satisfied by the replacement package.
    fn still_satisfied(
        &self,
        dependent: &Rc<Package>,
        capability: &Dependency,
        replacement: &Rc<Package>,
    ) -> Result<bool, Error> {
        let provides = replacement.provides()?;
        for req in dependent.requires()? {
            if req.name != capability.name {
                continue;
            }
            let by_provide = provides.iter().any(|provide| req.satisfies(provide));
            let by_file =
                req.is_file() && replacement.files()?.iter().any(|file| *file == req.name);
            if !by_provide && !by_file {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
