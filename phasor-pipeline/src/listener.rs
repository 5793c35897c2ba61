//! Task listeners for observing the pipeline.

use std::fmt;

use serde::Serialize;

/// The kind of work a [`TaskEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Parse,
    Enter,
    /// Annotation processing as a whole.
    Processing,
    /// One round of annotation processing.
    ProcessingRound,
    Attribute,
    Flow,
    Desugar,
    Generate,
}

impl TaskKind {
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Parse => "parse",
            TaskKind::Enter => "enter",
            TaskKind::Processing => "processing",
            TaskKind::ProcessingRound => "processing_round",
            TaskKind::Attribute => "attribute",
            TaskKind::Flow => "flow",
            TaskKind::Desugar => "desugar",
            TaskKind::Generate => "generate",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A task starting or finishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEvent {
    pub kind: TaskKind,
    /// What the task works on: a file, a type name or a round number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl TaskEvent {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            subject: None,
        }
    }

    pub fn on(kind: TaskKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: Some(subject.into()),
        }
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}({})", self.kind, subject),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Observes tasks as the pipeline runs them.
///
/// Listeners are shared with the successor pipeline created by annotation
/// processing, so one listener sees the whole compilation.
///
/// # Example
///
/// ```ignore
/// struct Printer;
///
/// impl TaskListener for Printer {
///     fn name(&self) -> &'static str { "printer" }
///
///     fn finished(&self, event: &TaskEvent) {
///         println!("done: {event}");
///     }
/// }
/// ```
pub trait TaskListener: Send + Sync {
    /// The name of this listener (for debugging and logging).
    fn name(&self) -> &'static str;

    /// Called before a task runs.
    #[allow(unused_variables)]
    fn started(&self, event: &TaskEvent) {}

    /// Called after a task completes, whether or not it produced anything.
    #[allow(unused_variables)]
    fn finished(&self, event: &TaskEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        assert_eq!(TaskEvent::new(TaskKind::Enter).to_string(), "enter");
        assert_eq!(
            TaskEvent::on(TaskKind::Attribute, "Base").to_string(),
            "attribute(Base)"
        );
        assert_eq!(
            TaskEvent::on(TaskKind::ProcessingRound, "1").to_string(),
            "processing_round(1)"
        );
    }
}
