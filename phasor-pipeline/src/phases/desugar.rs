//! Desugar phase - lowers environments in dependency order.

use std::sync::Arc;

use phasor_core::Phase;

use crate::{Artifact, EnvId, Fault, Pipeline, TaskEvent, TaskKind, schedule::scan_dependencies};

fn no_artifacts() -> Arc<[Artifact]> {
    Arc::from(Vec::new())
}

impl Pipeline {
    /// Desugar a batch of flowed environments.
    ///
    /// Environments that produced no classes are left out of the result.
    pub fn desugar(&mut self, ids: Vec<EnvId>) -> Result<Vec<(EnvId, Arc<[Artifact]>)>, Fault> {
        if self.should_stop(Phase::TransTypes) {
            return Ok(Vec::new());
        }

        let mut lowered = Vec::with_capacity(ids.len());
        for id in ids {
            let artifacts = self.desugar_env(id)?;
            if !artifacts.is_empty() {
                lowered.push((id, artifacts));
            }
        }
        Ok(self.stop_if(Phase::Lower, lowered))
    }

    /// Desugar one environment after forcing its supertypes through flow.
    ///
    /// The result is cached: asking again returns the same list without
    /// calling the backend.
    pub fn desugar_env(&mut self, id: EnvId) -> Result<Arc<[Artifact]>, Fault> {
        if self.should_stop(Phase::TransTypes) {
            return Ok(no_artifacts());
        }

        let unit = self.tracker.env(id).unit();
        if !self.config.implicit.generates_implicit() && !self.roots.contains(&unit) {
            tracing::debug!(class = self.tracker.env(id).name(), "skipping implicit class");
            return Ok(no_artifacts());
        }

        let artifacts = match self.scheduler.cache.get(id) {
            Some(cached) => cached,
            None => {
                if !self.scheduler.enter(id) {
                    return Ok(no_artifacts());
                }
                let lowered = self.desugar_uncached(id);
                self.scheduler.leave(id);
                match lowered? {
                    Some(artifacts) => artifacts,
                    None => return Ok(no_artifacts()),
                }
            }
        };

        if self.should_stop(Phase::Lower) {
            return Ok(no_artifacts());
        }
        Ok(artifacts)
    }

    fn desugar_uncached(&mut self, id: EnvId) -> Result<Option<Arc<[Artifact]>>, Fault> {
        let scan = scan_dependencies(&self.tracker, id);
        if !scan.cycle.is_empty() {
            self.scheduler
                .report_cycle(&self.tracker, &scan.cycle, &mut self.log);
        }

        for dependency in scan.dependencies {
            if self.tracker.is_done(dependency, Phase::Flow) {
                continue;
            }
            tracing::debug!(
                class = self.tracker.env(id).name(),
                dependency = self.tracker.env(dependency).name(),
                "scheduling supertype out of order"
            );
            let Some(attributed) = self.attribute_env(dependency)? else {
                continue;
            };
            let Some(flowed) = self.flow_env(attributed)? else {
                continue;
            };
            self.desugar_env(flowed)?;
        }

        if self.should_stop(Phase::TransTypes) {
            return Ok(None);
        }

        tracing::debug!(class = self.tracker.env(id).name(), "desugar");
        let event = TaskEvent::on(TaskKind::Desugar, self.subject(id));
        let Some(artifacts) = self.invoke(event, Phase::TransTypes, id, |backend, env, log| {
            backend.desugar(env, log)
        })?
        else {
            return Ok(None);
        };

        self.tracker.advance(id, Phase::TransTypes);
        self.tracker.advance(id, Phase::Lower);
        Ok(Some(self.scheduler.cache.insert(id, Arc::from(artifacts))))
    }
}
