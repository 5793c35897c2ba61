//! Reference collaborators for the phasor pipeline.
//!
//! Sources are TOML outlines that declare types, their supertypes, members
//! and annotations. [`OutlineFrontend`] parses them and finds supertypes on
//! a source path, [`OutlineBackend`] checks and lowers them and writes one
//! JSON file per class, and [`BuilderProcessor`] generates builder types
//! during annotation processing.
//!
//! # Example
//!
//! ```ignore
//! use phasor_core::CompilerConfig;
//! use phasor_outline::{BuilderProcessor, OutlineBackend, OutlineFrontend};
//! use phasor_pipeline::Pipeline;
//!
//! let outcome = Pipeline::new(
//!     CompilerConfig::default(),
//!     OutlineFrontend::new().with_sourcepath(vec!["lib".into()]),
//!     OutlineBackend::new().with_out_dir("out"),
//! )
//! .compile(&["src/Point.toml".into()], &[], vec![Box::new(BuilderProcessor::default())]);
//! ```

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod backend;
mod error;
mod frontend;
mod processor;
mod source;

pub use backend::OutlineBackend;
pub use error::{OutlineError, Result, SourceContext};
pub use frontend::OutlineFrontend;
pub use processor::BuilderProcessor;
pub use source::{ParseFailures, is_method, parse_outline, read_outline};

/// Types every outline can extend without declaring them.
pub const BUILTIN_TYPES: &[&str] = &["Object"];
