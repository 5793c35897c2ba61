//! Flow phase.

use phasor_core::Phase;

use crate::{EnvId, Fault, Pipeline, TaskEvent, TaskKind};

impl Pipeline {
    /// Run flow analysis on a batch of attributed environments.
    pub fn flow(&mut self, ids: Vec<EnvId>) -> Result<Vec<EnvId>, Fault> {
        let mut flowed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(id) = self.flow_env(id)? {
                flowed.push(id);
            }
        }
        Ok(self.stop_if(Phase::Flow, flowed))
    }

    /// Run flow analysis on one environment.
    pub fn flow_env(&mut self, id: EnvId) -> Result<Option<EnvId>, Fault> {
        if self.tracker.is_done(id, Phase::Flow) {
            return Ok(Some(id));
        }
        if self.should_stop(Phase::Flow) {
            return Ok(None);
        }

        tracing::debug!(class = self.tracker.env(id).name(), "flow");
        let event = TaskEvent::on(TaskKind::Flow, self.subject(id));
        let done = self.invoke(event, Phase::Flow, id, |backend, env, log| {
            backend.flow(env, log)
        })?;
        if done.is_none() {
            return Ok(None);
        }

        self.tracker.advance(id, Phase::Flow);
        if self.should_stop(Phase::Flow) {
            return Ok(None);
        }
        Ok(Some(id))
    }
}
