//! Compile command report data structures.

use phasor_core::{Phase, ToolInfo};
use phasor_pipeline::{CompileOutcome, ExitStatus};

use super::output::{Output, Report};

/// Report data from one compilation.
#[derive(Debug)]
pub struct CompileReport {
    /// The compiler that ran, for the bug-report banner.
    pub tool: ToolInfo,
    pub outcome: CompileOutcome,
    /// Source errors rendered with their snippets.
    pub source_errors: Vec<String>,
}

impl CompileReport {
    pub fn status(&self) -> ExitStatus {
        self.outcome.status
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

impl Report for CompileReport {
    fn render(&self, out: &mut dyn Output) {
        for rendered in &self.source_errors {
            out.diagnostic(rendered);
        }

        // parse errors were already shown with their snippets
        let snippets_shown = !self.source_errors.is_empty();
        for diag in self.outcome.diagnostics.iter() {
            if snippets_shown && diag.phase == Some(Phase::Parse) {
                continue;
            }
            out.diagnostic(&diag.to_string());
        }

        if self.status().is_internal() {
            out.diagnostic(&format!(
                "An exception has occurred in the compiler ({}). Please file a bug report at {}/issues with the sources and options that trigger it.",
                self.tool,
                env!("CARGO_PKG_REPOSITORY")
            ));
            if let Some(fault) = &self.outcome.fault {
                out.diagnostic(&format!("  caused by: {}", fault));
            }
        }

        let errors = self.outcome.error_count();
        let warnings = self.outcome.warning_count();
        if errors > 0 {
            out.diagnostic(&plural(errors, "error"));
        }
        if warnings > 0 {
            out.diagnostic(&plural(warnings, "warning"));
        }
    }
}

#[cfg(test)]
mod tests {
    use phasor_pipeline::{Diagnostic, Diagnostics, Fault};

    use super::*;
    use crate::reports::output::RecordingOutput;

    fn report(status: ExitStatus, diagnostics: Diagnostics, fault: Option<Fault>) -> CompileReport {
        CompileReport {
            tool: ToolInfo::new("phasor", "9.9.9"),
            outcome: CompileOutcome {
                status,
                diagnostics,
                emitted: Vec::new(),
                fault,
            },
            source_errors: Vec::new(),
        }
    }

    #[test]
    fn test_diagnostics_and_counts() {
        let mut log = Diagnostics::new();
        log.report(Diagnostic::error("cannot find symbol: class Missing").at("A.toml"));
        log.warning("unchecked conversion");
        log.warning("deprecated");

        let mut out = RecordingOutput::default();
        report(ExitStatus::Error, log, None).render(&mut out);

        assert_eq!(
            out.lines,
            vec![
                "! A.toml: error: cannot find symbol: class Missing",
                "! warning: unchecked conversion",
                "! warning: deprecated",
                "! 1 error",
                "! 2 warnings",
            ]
        );
    }

    #[test]
    fn test_internal_failure_shows_banner_with_version() {
        let mut log = Diagnostics::new();
        log.error("compilation aborted: corrupt state");

        let mut out = RecordingOutput::default();
        report(ExitStatus::Abnormal, log, Some(Fault::abort("corrupt state"))).render(&mut out);

        assert!(out.lines[1].contains("(phasor 9.9.9)"));
        assert_eq!(out.lines[2], "!   caused by: compilation aborted: corrupt state");
    }

    #[test]
    fn test_parse_diagnostics_give_way_to_snippets() {
        let mut log = Diagnostics::new();
        log.report(Diagnostic::error("expected a value").in_phase(Phase::Parse));

        let mut report = report(ExitStatus::Error, log, None);
        report.source_errors.push("× failed to parse outline".to_string());
        let mut out = RecordingOutput::default();
        report.render(&mut out);

        assert_eq!(out.lines, vec!["! × failed to parse outline", "! 1 error"]);
    }
}
