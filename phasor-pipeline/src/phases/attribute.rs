//! Attribute phase - type checks queued environments.

use phasor_core::Phase;

use crate::{EnvId, Fault, Pipeline, TaskEvent, TaskKind};

impl Pipeline {
    /// Attribute a batch of environments.
    ///
    /// Returns the environments that were attributed, or nothing if the
    /// pipeline should stop after attribution.
    pub fn attribute(&mut self, ids: Vec<EnvId>) -> Result<Vec<EnvId>, Fault> {
        let mut attributed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(id) = self.attribute_env(id)? {
                attributed.push(id);
            }
        }
        Ok(self.stop_if(Phase::Attr, attributed))
    }

    /// Attribute one environment. An environment that is already attributed
    /// is returned as is.
    pub fn attribute_env(&mut self, id: EnvId) -> Result<Option<EnvId>, Fault> {
        if self.tracker.is_done(id, Phase::Attr) {
            return Ok(Some(id));
        }
        if self.should_stop(Phase::Attr) {
            return Ok(None);
        }

        tracing::debug!(class = self.tracker.env(id).name(), "attribute");
        let event = TaskEvent::on(TaskKind::Attribute, self.subject(id));
        let done = self.invoke(event, Phase::Attr, id, |backend, env, log| {
            backend.attribute(env, log)
        })?;
        if done.is_none() {
            return Ok(None);
        }

        self.tracker.advance(id, Phase::Attr);
        if self.should_stop(Phase::Attr) {
            return Ok(None);
        }
        Ok(Some(id))
    }
}
