//! Multi-phase compilation pipeline coordinator.
//!
//! The [`Pipeline`] drives source units through the phase lattice defined in
//! [`phasor_core::Phase`]: parse, enter, annotation processing, then
//! attribute, flow, desugar and generate under one of the compile policies.
//! The actual work of each phase is done by collaborators behind the
//! [`Frontend`], [`Backend`] and [`Processor`] traits; this crate only
//! decides what runs when, tracks how far every type has got, and turns
//! failures into an [`ExitStatus`].
//!
//! # Module Organization
//!
//! - [`PhaseTracker`] - per-environment phase records
//! - [`Todo`] - the queue of entered environments
//! - [`Scheduler`], [`DesugarCache`] - dependency-ordered desugaring
//! - [`Processor`], [`Round`] - annotation processing
//! - [`TaskListener`], [`EventRecorder`] - observing the pipeline
//! - [`testing`] - scripted collaborators (feature-gated)

mod diagnostic;
mod env;
mod error;
mod listener;
mod outcome;
mod phases;
mod pipeline;
mod policy;
mod processing;
mod recorder;
mod schedule;
mod todo;
mod toolchain;
mod tracker;
mod unit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use diagnostic::{Category, Diagnostic, Diagnostics, Severity};
pub use env::{EnvId, TypeEnv};
pub use error::{Fault, ParseError, ProcessorError};
pub use listener::{TaskEvent, TaskKind, TaskListener};
pub use outcome::{CompileOutcome, ExitStatus};
pub use pipeline::Pipeline;
pub use processing::{ProcessingEnvironment, Processor, Round, RoundFailure};
pub use recorder::{Edge, EventRecorder, RecordedEvent};
pub use schedule::{DependencyScan, DesugarCache, Scheduler, scan_dependencies};
pub use todo::Todo;
pub use toolchain::{Artifact, Backend, EmittedFile, EnvRef, Frontend};
pub use tracker::PhaseTracker;
pub use unit::{SourceUnit, TypeDecl, UnitId};
