//! Annotation processing.
//!
//! Processing runs at most once per compilation, between entry and the
//! first attribution. When processors generate new units the pipeline is
//! replaced by a successor that holds them; the caller always continues
//! with the pipeline [`Pipeline::run_round`] hands back.

mod environment;
mod processor;

use std::fmt;

use phasor_core::ProcMode;
use thiserror::Error;

pub use environment::ProcessingEnvironment;
pub use processor::{Processor, Round};

use crate::{Fault, Pipeline, TaskEvent, TaskKind};

/// Where a pipeline stands with respect to annotation processing.
#[derive(Debug, Default)]
pub(crate) enum Gate {
    /// `init_round` has not run yet.
    #[default]
    Idle,
    /// Processing will not run.
    Disabled,
    /// Processing will run on the next `run_round`.
    Armed(ProcessingEnvironment),
    /// This pipeline was created by processing and never processes again.
    Delegate,
    /// Processing has run, or the pipeline is closed.
    Finished,
}

/// A fault raised while the pipeline was being driven, together with the
/// pipeline that was live at the time.
///
/// Processing may already have replaced the original pipeline, so the
/// caller gets the live one back to report and close.
#[derive(Error)]
#[error("{fault}")]
pub struct RoundFailure {
    pub pipeline: Box<Pipeline>,
    pub fault: Fault,
}

impl RoundFailure {
    pub(crate) fn new(pipeline: Pipeline, fault: Fault) -> Self {
        Self {
            pipeline: Box::new(pipeline),
            fault,
        }
    }
}

impl fmt::Debug for RoundFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundFailure")
            .field("fault", &self.fault)
            .field("errors", &self.pipeline.error_count())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Decide whether annotation processing runs for this compilation.
    ///
    /// Processing is enabled only for a pipeline that is not a delegate,
    /// when processing is not disabled and at least one processor is given.
    /// Otherwise the processors are dropped here.
    pub fn init_round(&mut self, processors: Vec<Box<dyn Processor>>) {
        if self.is_delegate() {
            return;
        }

        let enabled = self.config.proc != ProcMode::Disabled && !processors.is_empty();
        self.gate = if enabled {
            tracing::debug!(processors = processors.len(), "annotation processing enabled");
            Gate::Armed(ProcessingEnvironment::new(processors))
        } else {
            Gate::Disabled
        };
    }

    /// Returns true if the next [`run_round`](Self::run_round) will run
    /// processors.
    pub fn processing_enabled(&self) -> bool {
        matches!(self.gate, Gate::Armed(_))
    }

    /// Run annotation processing, if enabled.
    ///
    /// Consumes the pipeline and returns the one to continue with: this
    /// one when nothing was generated, otherwise a successor holding the
    /// original roots and the generated units. Diagnostics carry over.
    pub fn run_round(mut self, class_names: &[String]) -> Result<Pipeline, RoundFailure> {
        match std::mem::replace(&mut self.gate, Gate::Finished) {
            Gate::Armed(environment) => {
                let event = TaskEvent::new(TaskKind::Processing);
                self.notify_started(&event);
                let result = environment.run(self, class_names);
                match &result {
                    Ok(pipeline) => pipeline.notify_finished(&event),
                    Err(failure) => failure.pipeline.notify_finished(&event),
                }
                result
            }
            Gate::Delegate => {
                self.gate = Gate::Delegate;
                Ok(self)
            }
            gate => {
                if !class_names.is_empty() {
                    self.log.error(format!(
                        "class names given but annotation processing is not enabled: {}",
                        class_names.join(", ")
                    ));
                }
                if matches!(gate, Gate::Disabled) {
                    self.gate = Gate::Disabled;
                }
                Ok(self)
            }
        }
    }
}
