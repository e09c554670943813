//! Best-candidate selection for install intents.

use std::rc::Rc;

use ryum_repo::Package;
use ryum_types::Architecture;

/// Pick the best of several candidate packages for a host system
///
/// Candidates are ranked by EVR descending, ties broken by architecture
/// preference on the host, further ties by the lexicographically
/// smallest repository id. All other candidate handles are released.
pub(crate) fn best_candidate(
    candidates: Vec<Rc<Package>>,
    host: Architecture,
) -> Option<Rc<Package>> {
    candidates.into_iter().max_by(|a, b| {
        a.evr()
            .compare(b.evr())
            .then_with(|| Architecture::choose_best_for_system(host, a.arch(), b.arch()))
            .then_with(|| b.repo_id().cmp(a.repo_id()))
    })
}
