//! Per-environment phase tracking.

use std::{collections::HashMap, path::Path};

use phasor_core::Phase;

use crate::{Diagnostic, Diagnostics, EnvId, TypeDecl, TypeEnv, UnitId};

/// Owns every type environment of a pipeline and the highest phase each
/// one has completed.
///
/// Recorded phases never decrease: [`advance`](Self::advance) with a phase
/// at or below the current one does nothing. Nested environments share the
/// lifecycle of the type that encloses them, so advancing an environment
/// advances everything nested in it.
///
/// Ids are only minted here. Asking about an id this tracker never issued
/// is a programming error; it trips a debug assertion, and release builds
/// treat the environment as having completed nothing.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    envs: Vec<TypeEnv>,
    phases: Vec<Phase>,
    by_name: HashMap<String, EnvId>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create environments for `decl` and everything nested in it, all at
    /// [`Phase::Enter`].
    ///
    /// A name that is already taken is reported as an error and gets no
    /// environment; `None` is returned in that case.
    pub(crate) fn register(
        &mut self,
        unit: UnitId,
        origin: &Path,
        decl: &TypeDecl,
        enclosing: Option<EnvId>,
        log: &mut Diagnostics,
    ) -> Option<EnvId> {
        let name = match enclosing {
            Some(outer) => format!("{}.{}", self.env(outer).name, decl.name),
            None => decl.name.clone(),
        };

        if self.by_name.contains_key(&name) {
            log.report(
                Diagnostic::error(format!("duplicate class: {}", name))
                    .in_phase(Phase::Enter)
                    .at(origin.display().to_string()),
            );
            return None;
        }

        let id = EnvId(self.envs.len() as u32);
        self.envs.push(TypeEnv {
            id,
            unit,
            origin: origin.to_path_buf(),
            name: name.clone(),
            extends: decl.extends.clone(),
            annotations: decl.annotations.clone(),
            members: decl.members.clone(),
            deprecated: decl.deprecated,
            enclosing,
            nested: Vec::new(),
        });
        self.phases.push(Phase::Enter);
        self.by_name.insert(name, id);

        for nested in &decl.nested {
            if let Some(child) = self.register(unit, origin, nested, Some(id), log) {
                self.envs[id.index()].nested.push(child);
            }
        }

        Some(id)
    }

    /// Number of environments.
    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Get an environment.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tracker.
    pub fn env(&self, id: EnvId) -> &TypeEnv {
        &self.envs[id.index()]
    }

    /// Get an environment, if `id` belongs to this tracker.
    pub fn get(&self, id: EnvId) -> Option<&TypeEnv> {
        self.envs.get(id.index())
    }

    /// Find the environment declaring a qualified type name.
    pub fn lookup(&self, name: &str) -> Option<EnvId> {
        self.by_name.get(name).copied()
    }

    /// The top-level environment that (transitively) encloses `id`.
    pub fn outermost(&self, id: EnvId) -> EnvId {
        let mut current = id;
        while let Some(outer) = self.get(current).and_then(TypeEnv::enclosing) {
            current = outer;
        }
        current
    }

    /// The recorded phase of an environment.
    pub fn phase(&self, id: EnvId) -> Option<Phase> {
        let phase = self.phases.get(id.index()).copied();
        debug_assert!(phase.is_some(), "unknown environment {id}");
        phase
    }

    /// Returns true if the environment has completed `phase`.
    pub fn is_done(&self, id: EnvId, phase: Phase) -> bool {
        self.phase(id).is_some_and(|current| current >= phase)
    }

    /// Record that an environment (and everything nested in it) has
    /// completed `phase`. Never moves backwards.
    pub fn advance(&mut self, id: EnvId, phase: Phase) {
        let Some(current) = self.phases.get_mut(id.index()) else {
            debug_assert!(false, "unknown environment {id}");
            return;
        };
        if phase > *current {
            *current = phase;
        }
        for nested in self.envs[id.index()].nested.clone() {
            self.advance(nested, phase);
        }
    }

    /// All environments, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeEnv> {
        self.envs.iter()
    }

    /// Environments declared by a unit, nested ones included.
    pub fn in_unit(&self, unit: UnitId) -> impl Iterator<Item = &TypeEnv> {
        self.envs.iter().filter(move |env| env.unit == unit)
    }

    pub(crate) fn clear(&mut self) {
        self.envs.clear();
        self.phases.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(decls: &[TypeDecl]) -> (PhaseTracker, Vec<EnvId>, Diagnostics) {
        let mut tracker = PhaseTracker::new();
        let mut log = Diagnostics::new();
        let ids = decls
            .iter()
            .filter_map(|decl| {
                tracker.register(UnitId(0), Path::new("A.toml"), decl, None, &mut log)
            })
            .collect();
        (tracker, ids, log)
    }

    #[test]
    fn test_registered_envs_start_at_enter() {
        let (tracker, ids, _) = tracker_with(&[TypeDecl::new("A")]);
        assert_eq!(tracker.phase(ids[0]), Some(Phase::Enter));
        assert!(tracker.is_done(ids[0], Phase::Parse));
        assert!(tracker.is_done(ids[0], Phase::Enter));
        assert!(!tracker.is_done(ids[0], Phase::Attr));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let (mut tracker, ids, _) = tracker_with(&[TypeDecl::new("A")]);
        let id = ids[0];

        tracker.advance(id, Phase::Flow);
        assert!(tracker.is_done(id, Phase::Attr));
        assert!(tracker.is_done(id, Phase::Flow));

        tracker.advance(id, Phase::Attr);
        assert_eq!(tracker.phase(id), Some(Phase::Flow));

        for phase in Phase::ALL {
            tracker.advance(id, phase);
            for earlier in Phase::ALL.iter().filter(|p| **p <= phase) {
                assert!(tracker.is_done(id, *earlier));
            }
        }
        assert_eq!(tracker.phase(id), Some(Phase::Generate));
    }

    #[test]
    fn test_nested_envs_follow_enclosing() {
        let outer = TypeDecl::new("Outer").with_nested(TypeDecl::new("Inner"));
        let (mut tracker, ids, _) = tracker_with(&[outer]);
        let inner = tracker.lookup("Outer.Inner").unwrap();

        assert_eq!(tracker.env(inner).enclosing(), Some(ids[0]));
        assert_eq!(tracker.outermost(inner), ids[0]);
        assert_eq!(tracker.env(inner).flat_name(), "Outer$Inner");

        tracker.advance(ids[0], Phase::Lower);
        assert!(tracker.is_done(inner, Phase::Lower));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let (tracker, ids, log) = tracker_with(&[TypeDecl::new("A"), TypeDecl::new("A")]);
        assert_eq!(ids.len(), 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(log.error_count(), 1);
        assert!(log.iter().next().unwrap().message.contains("duplicate class: A"));
    }

    #[test]
    fn test_in_unit() {
        let outer = TypeDecl::new("Outer").with_nested(TypeDecl::new("Inner"));
        let (tracker, _, _) = tracker_with(&[outer, TypeDecl::new("B")]);
        assert_eq!(tracker.in_unit(UnitId(0)).count(), 3);
        assert_eq!(tracker.in_unit(UnitId(1)).count(), 0);
    }
}
