//! Collaborator interfaces the pipeline drives.
//!
//! The pipeline only schedules. Reading sources, checking types, lowering
//! and writing class files are done by a [`Frontend`] and a [`Backend`]
//! supplied by the caller.

use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use phasor_core::Phase;
use serde::Serialize;

use crate::{Diagnostics, EnvId, Fault, ParseError, PhaseTracker, SourceUnit, TypeEnv};

/// A generatable class produced by desugaring one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Binary class name, nested classes flattened as `Outer$Inner`.
    pub class_name: String,
    /// The environment the class was desugared from.
    pub env: EnvId,
    /// Members of the lowered class.
    pub members: Vec<String>,
}

impl Artifact {
    pub fn new(class_name: impl Into<String>, env: EnvId, members: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            env,
            members,
        }
    }
}

/// A file written by the generate phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    pub class_name: String,
    pub path: PathBuf,
}

/// Read access to one environment and, through it, to the others.
///
/// Collaborators get this instead of a bare [`TypeEnv`] so they can resolve
/// supertypes and see how far they have progressed.
#[derive(Debug, Clone, Copy)]
pub struct EnvRef<'a> {
    id: EnvId,
    tracker: &'a PhaseTracker,
}

impl<'a> EnvRef<'a> {
    pub(crate) fn new(id: EnvId, tracker: &'a PhaseTracker) -> Self {
        Self { id, tracker }
    }

    /// Resolve the declared supertype, if it is declared in this
    /// compilation.
    ///
    /// Nested types see their siblings first, then top-level types.
    pub fn supertype(&self) -> Option<EnvRef<'a>> {
        let name = self.extends()?;
        self.resolve(name)
    }

    /// Look up another environment by qualified name.
    pub fn lookup(&self, name: &str) -> Option<EnvRef<'a>> {
        self.tracker
            .lookup(name)
            .map(|id| EnvRef::new(id, self.tracker))
    }

    /// The phase recorded for an environment.
    pub fn phase_of(&self, other: EnvId) -> Option<Phase> {
        self.tracker.get(other)?;
        self.tracker.phase(other)
    }

    /// The phase recorded for this environment.
    pub fn phase(&self) -> Option<Phase> {
        self.phase_of(self.id)
    }

    /// Directly nested environments.
    pub fn nested_envs(self) -> impl Iterator<Item = EnvRef<'a>> + 'a {
        let tracker = self.tracker;
        tracker
            .env(self.id)
            .nested()
            .iter()
            .map(move |id| EnvRef::new(*id, tracker))
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<EnvRef<'a>> {
        if let Some(outer) = self.enclosing() {
            let sibling = format!("{}.{}", self.tracker.env(outer).name(), name);
            if let Some(found) = self.lookup(&sibling) {
                return Some(found);
            }
        }
        self.lookup(name)
    }
}

impl Deref for EnvRef<'_> {
    type Target = TypeEnv;

    fn deref(&self) -> &TypeEnv {
        self.tracker.env(self.id)
    }
}

/// Reads sources and enters their symbols.
pub trait Frontend: Send {
    /// Parse one source file.
    fn parse(&mut self, path: &Path) -> Result<SourceUnit, ParseError>;

    /// Register the symbols of `units`.
    ///
    /// Returns units read implicitly while entering, such as supertypes
    /// found on a source path. The pipeline tracks those as non-roots.
    fn enter(
        &mut self,
        units: &[&SourceUnit],
        log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, Fault>;

    /// Release any resources held by the frontend.
    fn close(&mut self) {}
}

/// Checks and lowers environments and writes class files.
///
/// The pipeline never calls `attribute` or `flow` twice for the same
/// environment.
pub trait Backend: Send {
    fn attribute(&mut self, env: EnvRef<'_>, log: &mut Diagnostics) -> Result<(), Fault>;

    fn flow(&mut self, env: EnvRef<'_>, log: &mut Diagnostics) -> Result<(), Fault>;

    /// Lower an environment and its nested types into classes.
    fn desugar(&mut self, env: EnvRef<'_>, log: &mut Diagnostics) -> Result<Vec<Artifact>, Fault>;

    /// Write one class. `None` means nothing was written.
    fn generate(
        &mut self,
        env: EnvRef<'_>,
        artifact: &Artifact,
        log: &mut Diagnostics,
    ) -> Result<Option<EmittedFile>, Fault>;

    /// Release any resources held by the backend.
    fn close(&mut self) {}
}

pub(crate) struct Toolchain {
    pub(crate) frontend: Box<dyn Frontend>,
    pub(crate) backend: Box<dyn Backend>,
}

impl Toolchain {
    pub(crate) fn close(mut self) {
        self.frontend.close();
        self.backend.close();
    }
}
