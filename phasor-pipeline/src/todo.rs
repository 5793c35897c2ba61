//! The queue of entered environments waiting for attribution.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::{EnvId, TypeEnv, UnitId};

/// FIFO of top-level environments populated during entry.
///
/// Nested environments are never queued; they travel with the type that
/// encloses them.
#[derive(Debug, Default)]
pub struct Todo {
    queue: VecDeque<(EnvId, UnitId)>,
}

impl Todo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an environment.
    pub fn add(&mut self, env: &TypeEnv) {
        self.queue.push_back((env.id(), env.unit()));
    }

    /// Remove the environment at the front.
    pub fn remove(&mut self) -> Option<EnvId> {
        self.queue.pop_front().map(|(id, _)| id)
    }

    /// Remove every environment, in queue order.
    pub fn drain_all(&mut self) -> Vec<EnvId> {
        self.queue.drain(..).map(|(id, _)| id).collect()
    }

    /// Remove every environment, grouped by declaring unit.
    ///
    /// Groups are ordered by the first appearance of their unit and keep
    /// queue order inside.
    pub fn group_by_unit(&mut self) -> IndexMap<UnitId, Vec<EnvId>> {
        let mut groups: IndexMap<UnitId, Vec<EnvId>> = IndexMap::new();
        for (id, unit) in self.queue.drain(..) {
            groups.entry(unit).or_default().push(id);
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, id: EnvId) -> bool {
        self.queue.iter().any(|(queued, _)| *queued == id)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn env(id: u32, unit: u32) -> TypeEnv {
        TypeEnv {
            id: EnvId(id),
            unit: UnitId(unit),
            origin: PathBuf::from(format!("U{unit}.toml")),
            name: format!("T{id}"),
            extends: None,
            annotations: Vec::new(),
            members: Vec::new(),
            deprecated: false,
            enclosing: None,
            nested: Vec::new(),
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut todo = Todo::new();
        todo.add(&env(0, 0));
        todo.add(&env(1, 0));

        assert_eq!(todo.len(), 2);
        assert!(todo.contains(EnvId(1)));
        assert_eq!(todo.remove(), Some(EnvId(0)));
        assert_eq!(todo.remove(), Some(EnvId(1)));
        assert_eq!(todo.remove(), None);
        assert!(todo.is_empty());
    }

    #[test]
    fn test_group_by_unit_keeps_first_appearance_order() {
        let mut todo = Todo::new();
        todo.add(&env(0, 1));
        todo.add(&env(1, 0));
        todo.add(&env(2, 1));
        todo.add(&env(3, 0));

        let groups = todo.group_by_unit();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![UnitId(1), UnitId(0)]);
        assert_eq!(groups[&UnitId(1)], vec![EnvId(0), EnvId(2)]);
        assert_eq!(groups[&UnitId(0)], vec![EnvId(1), EnvId(3)]);
        assert!(todo.is_empty());
    }

    #[test]
    fn test_drain_all() {
        let mut todo = Todo::new();
        todo.add(&env(0, 0));
        todo.add(&env(1, 1));
        assert_eq!(todo.drain_all(), vec![EnvId(0), EnvId(1)]);
        assert!(todo.is_empty());
    }
}
