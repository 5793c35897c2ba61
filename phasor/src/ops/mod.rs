//! Core operations.
//!
//! This module contains the business logic for phasor commands,
//! separated from CLI argument parsing and output rendering.

pub mod compile;
pub mod phases;

pub use compile::compile;
pub use phases::phases;
