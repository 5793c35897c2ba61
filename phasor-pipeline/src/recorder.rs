//! A listener that records task events for debugging.

use std::{
    fs,
    path::Path,
    sync::{PoisonError, RwLock},
};

use eyre::Result;
use serde::Serialize;

use crate::{TaskEvent, TaskListener};

/// Whether a recorded event marks the start or the end of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Started,
    Finished,
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    pub edge: Edge,
    #[serde(flatten)]
    pub event: TaskEvent,
}

/// A listener that keeps every event it sees.
///
/// # Example
///
/// ```ignore
/// let recorder = Arc::new(EventRecorder::new());
/// let outcome = Pipeline::new(config, frontend, backend)
///     .listener(recorder.clone())
///     .compile(&sources, &[], Vec::new());
///
/// recorder.write_to_dir(".phasor/trace")?;
/// ```
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: RwLock<Vec<RecordedEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Finished tasks rendered as `kind(subject)`, in completion order.
    pub fn trace(&self) -> Vec<String> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|recorded| recorded.edge == Edge::Finished)
            .map(|recorded| recorded.event.to_string())
            .collect()
    }

    /// Write all events to `events.json` in `dir`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let events = self.events();
        let json = serde_json::to_string_pretty(&events)?;
        fs::write(dir.join("events.json"), json)?;

        Ok(())
    }

    fn record(&self, edge: Edge, event: &TaskEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                edge,
                event: event.clone(),
            });
    }
}

impl TaskListener for EventRecorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn started(&self, event: &TaskEvent) {
        self.record(Edge::Started, event);
    }

    fn finished(&self, event: &TaskEvent) {
        self.record(Edge::Finished, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskKind;

    #[test]
    fn test_trace_lists_finished_tasks() {
        let recorder = EventRecorder::new();
        let event = TaskEvent::on(TaskKind::Flow, "A");
        recorder.started(&event);
        recorder.finished(&event);

        assert_eq!(recorder.events().len(), 2);
        assert_eq!(recorder.trace(), vec!["flow(A)"]);
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = EventRecorder::new();
        recorder.finished(&TaskEvent::new(TaskKind::Enter));

        recorder.write_to_dir(dir.path()).unwrap();

        let written = fs::read_to_string(dir.path().join("events.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value[0]["edge"], "finished");
        assert_eq!(value[0]["kind"], "enter");
    }
}
