//! Core types for the phasor compiler pipeline.
//!
//! This crate provides the vocabulary shared by the pipeline coordinator,
//! the reference toolchain and the command line:
//!
//! - [`Phase`] - the ordered phase lattice every type environment walks
//! - [`CompilePolicy`], [`ImplicitSourcePolicy`], [`ProcMode`] - scheduling knobs
//! - [`CompilerConfig`], [`ProjectFile`] - configuration loaded from `phasor.toml`

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod config;
mod error;
mod phase;
mod policy;

pub use config::{CompilerConfig, PathsConfig, Project, ProjectFile, ToolInfo};
pub use error::{Error, Result, SourceContext};
pub use phase::Phase;
pub use policy::{CompilePolicy, ImplicitSourcePolicy, ProcMode};
