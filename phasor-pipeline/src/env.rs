//! Type environments, the unit of scheduling.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::UnitId;

/// Identifies a type environment within one pipeline.
///
/// Ids are minted by [`PhaseTracker`](crate::PhaseTracker) and index its
/// arena directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EnvId(pub(crate) u32);

impl EnvId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env#{}", self.0)
    }
}

/// One declared type together with where it lives.
#[derive(Debug, Clone)]
pub struct TypeEnv {
    pub(crate) id: EnvId,
    pub(crate) unit: UnitId,
    pub(crate) origin: PathBuf,
    pub(crate) name: String,
    pub(crate) extends: Option<String>,
    pub(crate) annotations: Vec<String>,
    pub(crate) members: Vec<String>,
    pub(crate) deprecated: bool,
    pub(crate) enclosing: Option<EnvId>,
    pub(crate) nested: Vec<EnvId>,
}

impl TypeEnv {
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// The unit that declares this type.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Origin of the declaring unit.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Qualified name, with nested types separated by dots (`Outer.Inner`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binary name, with nested types separated by `$` (`Outer$Inner`).
    pub fn flat_name(&self) -> String {
        self.name.replace('.', "$")
    }

    /// The declared supertype name, unresolved.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// The environment of the enclosing type, for nested types.
    pub fn enclosing(&self) -> Option<EnvId> {
        self.enclosing
    }

    /// Environments of directly nested types.
    pub fn nested(&self) -> &[EnvId] {
        &self.nested
    }

    pub fn is_top_level(&self) -> bool {
        self.enclosing.is_none()
    }
}
