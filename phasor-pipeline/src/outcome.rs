//! The result of a whole compilation.

use serde::Serialize;

use crate::{Diagnostics, EmittedFile, Fault};

/// Exit classification of a compilation.
///
/// `Error` means the program being compiled has problems. `SysErr` and
/// `Abnormal` mean the compiler itself failed and deserve a bug report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    /// Compilation completed with no errors.
    Ok,
    /// Compilation completed but reported errors.
    Error,
    /// Bad command line arguments.
    CmdErr,
    /// A system error or resource exhaustion.
    SysErr,
    /// The compiler terminated abnormally.
    Abnormal,
}

impl ExitStatus {
    /// The process exit code for this status.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::Error => 1,
            ExitStatus::CmdErr => 2,
            ExitStatus::SysErr => 3,
            ExitStatus::Abnormal => 4,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ExitStatus::Ok
    }

    /// Returns true if the compiler itself failed.
    pub fn is_internal(self) -> bool {
        matches!(self, ExitStatus::SysErr | ExitStatus::Abnormal)
    }
}

/// Everything a caller gets back from [`Pipeline::compile`].
///
/// [`Pipeline::compile`]: crate::Pipeline::compile
#[derive(Debug)]
pub struct CompileOutcome {
    pub status: ExitStatus,
    pub diagnostics: Diagnostics,
    /// Files written, in generation order.
    pub emitted: Vec<EmittedFile>,
    /// The fault that ended the compilation early, if any.
    pub fault: Option<Fault>,
}

impl CompileOutcome {
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.warning_count()
    }

    /// Class names of the emitted files, in generation order.
    pub fn emitted_classes(&self) -> Vec<&str> {
        self.emitted.iter().map(|f| f.class_name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Ok.code(), 0);
        assert_eq!(ExitStatus::Error.code(), 1);
        assert_eq!(ExitStatus::CmdErr.code(), 2);
        assert_eq!(ExitStatus::SysErr.code(), 3);
        assert_eq!(ExitStatus::Abnormal.code(), 4);
    }

    #[test]
    fn test_internal_statuses() {
        assert!(!ExitStatus::Error.is_internal());
        assert!(ExitStatus::SysErr.is_internal());
        assert!(ExitStatus::Abnormal.is_internal());
    }
}
