//! Phase operations.
//!
//! Every policy funnels through the same four operations:
//!
//! - attribute: check an environment's types
//! - flow: dataflow checks on an attributed environment
//! - desugar: lower an environment once its supertypes are flowed
//! - generate: write the classes produced by desugar
//!
//! Each checks [`Pipeline::should_stop`] before doing work and again after
//! producing results, and hands back an empty result on either check.

mod attribute;
mod desugar;
mod flow;
mod generate;

use phasor_core::Phase;

use crate::{Backend, Diagnostic, Diagnostics, EnvId, EnvRef, Fault, Pipeline, TaskEvent};

impl Pipeline {
    /// Call the backend for one environment.
    ///
    /// Completion failures are reported against the environment and yield
    /// `None`; any other fault is returned.
    pub(crate) fn invoke<T>(
        &mut self,
        event: TaskEvent,
        phase: Phase,
        id: EnvId,
        call: impl FnOnce(&mut dyn Backend, EnvRef<'_>, &mut Diagnostics) -> Result<T, Fault>,
    ) -> Result<Option<T>, Fault> {
        if self.toolchain.is_none() {
            return Err(Fault::Closed);
        }
        self.notify_started(&event);

        let result = match self.toolchain.as_mut() {
            Some(toolchain) => call(
                toolchain.backend.as_mut(),
                EnvRef::new(id, &self.tracker),
                &mut self.log,
            ),
            None => Err(Fault::Closed),
        };

        self.notify_finished(&event);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(fault) if fault.is_recoverable() => {
                let env = self.tracker.env(id);
                tracing::debug!(class = env.name(), %fault, "completion failed");
                self.log.report(
                    Diagnostic::error(fault.to_string())
                        .in_phase(phase)
                        .at(env.origin().display().to_string()),
                );
                Ok(None)
            }
            Err(fault) => Err(fault),
        }
    }

    fn subject(&self, id: EnvId) -> String {
        self.tracker.env(id).name().to_string()
    }
}
