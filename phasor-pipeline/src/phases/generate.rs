//! Generate phase.

use std::sync::Arc;

use phasor_core::Phase;

use crate::{Artifact, EmittedFile, EnvId, Fault, Pipeline, TaskEvent, TaskKind};

impl Pipeline {
    /// Write the classes of a desugared batch.
    ///
    /// Returns the files written by this call; they are also added to
    /// [`emitted`](Pipeline::emitted).
    pub fn generate(
        &mut self,
        batch: Vec<(EnvId, Arc<[Artifact]>)>,
    ) -> Result<Vec<EmittedFile>, Fault> {
        let mut written = Vec::new();
        for (id, artifacts) in batch {
            if self.should_stop(Phase::Generate) {
                break;
            }
            for artifact in artifacts.iter() {
                let event = TaskEvent::on(TaskKind::Generate, artifact.class_name.clone());
                let file = self.invoke(event, Phase::Generate, id, |backend, env, log| {
                    backend.generate(env, artifact, log)
                })?;
                if let Some(Some(file)) = file {
                    tracing::debug!(class = %file.class_name, path = %file.path.display(), "generated");
                    self.emitted.push(file.clone());
                    written.push(file);
                }
            }
            self.tracker.advance(id, Phase::Generate);
        }
        Ok(self.stop_if(Phase::Generate, written))
    }
}
