//! Dependency ordering for desugaring.
//!
//! A type may only be desugared once every supertype declared in the same
//! compilation has been flow-checked. The scan here finds those supertypes;
//! the desugar phase forces them through the earlier phases out of band.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use phasor_core::Phase;

use crate::{Artifact, Diagnostic, Diagnostics, EnvId, EnvRef, PhaseTracker};

/// Desugar results by environment.
///
/// Entries are written once and never invalidated, so asking again for the
/// same environment hands back the same allocation.
#[derive(Debug, Default)]
pub struct DesugarCache {
    entries: HashMap<EnvId, Arc<[Artifact]>>,
}

impl DesugarCache {
    pub fn get(&self, id: EnvId) -> Option<Arc<[Artifact]>> {
        self.entries.get(&id).cloned()
    }

    pub fn contains(&self, id: EnvId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Store the result for an environment. A second insert keeps the
    /// first value.
    pub fn insert(&mut self, id: EnvId, artifacts: Arc<[Artifact]>) -> Arc<[Artifact]> {
        self.entries.entry(id).or_insert(artifacts).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Supertype environments an environment depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyScan {
    /// Outermost environments of the supertype chain, in discovery order.
    pub dependencies: Vec<EnvId>,
    /// Environments forming a cycle, if the walk ran into one.
    pub cycle: Vec<EnvId>,
}

/// Walk the supertype chains of `root` and of every type nested in it.
///
/// Only supertypes declared in this compilation are followed. Each one is
/// recorded as its outermost environment; the outermost environment of
/// `root` itself is never a dependency. Chains share one visited set, and
/// each walk stops at the first environment already seen.
pub fn scan_dependencies(tracker: &PhaseTracker, root: EnvId) -> DependencyScan {
    let mut scan = DependencyScan::default();
    if tracker.get(root).is_none() {
        debug_assert!(false, "unknown environment {root}");
        return scan;
    }

    let home = tracker.outermost(root);
    let mut visited = vec![false; tracker.len()];
    let mut pending = vec![root];
    let mut starts = Vec::new();
    while let Some(id) = pending.pop() {
        starts.push(id);
        pending.extend(tracker.env(id).nested().iter().rev().copied());
    }

    for start in starts {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        let mut path = vec![start];

        let mut cursor = EnvRef::new(start, tracker);
        while let Some(target) = cursor.supertype() {
            let id = target.id();
            if visited[id.index()] {
                if let Some(at) = path.iter().position(|seen| *seen == id) {
                    if scan.cycle.is_empty() {
                        scan.cycle = path[at..].to_vec();
                    }
                }
                break;
            }
            visited[id.index()] = true;
            path.push(id);

            let dependency = tracker.outermost(id);
            if dependency != home && !scan.dependencies.contains(&dependency) {
                scan.dependencies.push(dependency);
            }
            cursor = target;
        }
    }

    scan
}

/// Scheduling state owned by a pipeline.
#[derive(Debug, Default)]
pub struct Scheduler {
    pub(crate) cache: DesugarCache,
    active: HashSet<EnvId>,
    cycles_reported: HashSet<EnvId>,
}

impl Scheduler {
    pub fn cache(&self) -> &DesugarCache {
        &self.cache
    }

    /// Mark an environment as being desugared. Returns false if it
    /// already is.
    pub(crate) fn enter(&mut self, id: EnvId) -> bool {
        self.active.insert(id)
    }

    pub(crate) fn leave(&mut self, id: EnvId) {
        self.active.remove(&id);
    }

    /// Report a cycle unless one of its members was reported before.
    pub(crate) fn report_cycle(
        &mut self,
        tracker: &PhaseTracker,
        cycle: &[EnvId],
        log: &mut Diagnostics,
    ) {
        let Some(first) = cycle.first() else {
            return;
        };
        if cycle.iter().any(|id| self.cycles_reported.contains(id)) {
            return;
        }
        self.cycles_reported.extend(cycle.iter().copied());

        let env = tracker.env(*first);
        tracing::warn!(class = env.name(), "cyclic inheritance");
        log.report(
            Diagnostic::warning(format!("cyclic inheritance involving {}", env.name()))
                .in_phase(Phase::TransTypes)
                .at(env.origin().display().to_string()),
        );
    }

    pub(crate) fn clear(&mut self) {
        self.cache.clear();
        self.active.clear();
        self.cycles_reported.clear();
    }
}
