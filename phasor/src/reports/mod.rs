//! Report data structures for commands.
//!
//! Commands build reports, then render them to an Output target.

mod compile;
mod output;
mod phases;

pub use compile::CompileReport;
pub use output::{Report, TerminalOutput};
pub use phases::{PhasesReport, PolicyInfo};
