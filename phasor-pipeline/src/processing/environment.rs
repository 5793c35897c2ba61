//! Processing rounds.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use phasor_core::{ImplicitSourcePolicy, Phase};

use crate::{
    Diagnostic, EnvId, Fault, Pipeline, Processor, RoundFailure, SourceUnit, TaskEvent, TaskKind,
    processing::Round,
};

/// Runs processors round by round until they stop generating units.
pub struct ProcessingEnvironment {
    processors: Vec<Box<dyn Processor>>,
    rounds: usize,
}

impl fmt::Debug for ProcessingEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.processors.iter().map(|p| p.name()).collect();
        f.debug_struct("ProcessingEnvironment")
            .field("processors", &names)
            .field("rounds", &self.rounds)
            .finish()
    }
}

impl ProcessingEnvironment {
    pub(crate) fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self {
            processors,
            rounds: 0,
        }
    }

    /// Run every round and return the pipeline to continue with.
    ///
    /// Rounds repeat while processors generate units and no errors have
    /// been reported. A final round with no elements follows; units
    /// generated there are compiled but never processed.
    pub(crate) fn run(
        mut self,
        pipeline: Pipeline,
        class_names: &[String],
    ) -> Result<Pipeline, RoundFailure> {
        let mut pipeline = pipeline;
        let mut explicit = Some(resolve_names(&mut pipeline, class_names));

        loop {
            if pipeline.log.has_errors() {
                tracing::debug!("errors reported, skipping further processing rounds");
                break;
            }
            let generated = match self.round(&mut pipeline, explicit.take(), false) {
                Ok(generated) => generated,
                Err(fault) => return Err(RoundFailure::new(pipeline, fault)),
            };
            if generated.is_empty() {
                break;
            }
            pipeline = pipeline.successor(generated)?;
        }

        let late = match self.round(&mut pipeline, None, true) {
            Ok(late) => late,
            Err(fault) => return Err(RoundFailure::new(pipeline, fault)),
        };
        if !late.is_empty() {
            for unit in &late {
                for name in unit.declared_names() {
                    pipeline.log.report(
                        Diagnostic::warning(format!(
                            "type '{}' created in the last round will not be subject to annotation processing",
                            name
                        ))
                        .in_phase(Phase::Process)
                        .at(unit.origin().display().to_string()),
                    );
                }
            }
            pipeline = pipeline.successor(late)?;
        }

        if pipeline.config.implicit == ImplicitSourcePolicy::Unset && pipeline.implicit_read {
            pipeline.log.report(
                Diagnostic::warning(
                    "implicitly compiled files were not subject to annotation processing; \
                     set an implicit policy to choose whether they are compiled",
                )
                .in_phase(Phase::Process),
            );
        }

        Ok(pipeline)
    }

    fn round(
        &mut self,
        pipeline: &mut Pipeline,
        explicit: Option<Vec<EnvId>>,
        last: bool,
    ) -> Result<Vec<SourceUnit>, Fault> {
        self.rounds += 1;

        let mut elements: Vec<EnvId> = Vec::new();
        if !last {
            for unit in &pipeline.fresh_units {
                elements.extend(
                    pipeline
                        .tracker
                        .in_unit(*unit)
                        .filter(|env| env.is_top_level())
                        .map(|env| env.id()),
                );
            }
        }
        for id in explicit.unwrap_or_default() {
            if !elements.contains(&id) {
                elements.push(id);
            }
        }
        pipeline.fresh_units.clear();

        tracing::debug!(round = self.rounds, elements = elements.len(), last, "processing round");
        let event = TaskEvent::on(TaskKind::ProcessingRound, self.rounds.to_string());
        pipeline.notify_started(&event);

        let round = Round {
            number: self.rounds,
            elements: elements.iter().map(|id| pipeline.tracker.env(*id)).collect(),
            last,
        };

        let mut generated = Vec::new();
        let mut failure = None;
        for processor in &mut self.processors {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                processor.process(&round, &mut pipeline.log)
            }));
            let message = match outcome {
                Ok(Ok(units)) => {
                    generated.extend(units);
                    continue;
                }
                Ok(Err(err)) => err.message,
                Err(payload) => panic_message(payload.as_ref()),
            };
            failure = Some(Fault::Processing {
                processor: processor.name().to_string(),
                message,
            });
            break;
        }

        pipeline.notify_finished(&event);
        match failure {
            Some(fault) => Err(fault),
            None => Ok(generated),
        }
    }
}

/// Resolve explicitly named types against entered environments.
fn resolve_names(pipeline: &mut Pipeline, class_names: &[String]) -> Vec<EnvId> {
    let mut resolved = Vec::with_capacity(class_names.len());
    for name in class_names {
        match pipeline.tracker.lookup(name) {
            Some(id) => resolved.push(id),
            None => pipeline.log.report(
                Diagnostic::error(format!("could not find class: {}", name))
                    .in_phase(Phase::Process),
            ),
        }
    }
    resolved
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "processor panicked".to_string()
    }
}
