//! Compile policies - how the queue is drained.

use phasor_core::{CompilePolicy, Phase};

use crate::{EnvId, Fault, Pipeline};

impl Pipeline {
    /// Drain the queue according to the configured policy.
    pub fn compile_queue(&mut self) -> Result<(), Fault> {
        let policy = self.config.policy;
        tracing::debug!(%policy, queued = self.todo.len(), "draining queue");

        match policy {
            CompilePolicy::AttrOnly => {
                let queued = self.todo.drain_all();
                self.attribute(queued)?;
            }
            CompilePolicy::CheckOnly => {
                let queued = self.todo.drain_all();
                let attributed = self.attribute(queued)?;
                self.flow(attributed)?;
            }
            CompilePolicy::Simple => {
                let queued = self.todo.drain_all();
                self.run_batch(queued)?;
            }
            CompilePolicy::ByFile => {
                for (unit, group) in self.todo.group_by_unit() {
                    if self.should_stop(Phase::Attr) {
                        tracing::debug!(%unit, "stopping before file");
                        break;
                    }
                    self.run_batch(group)?;
                }
            }
            CompilePolicy::ByTodo => {
                while let Some(id) = self.todo.remove() {
                    self.run_batch(vec![id])?;
                }
            }
        }
        Ok(())
    }

    /// Push a batch through attribute, flow, desugar and generate.
    fn run_batch(&mut self, ids: Vec<EnvId>) -> Result<(), Fault> {
        let attributed = self.attribute(ids)?;
        let flowed = self.flow(attributed)?;
        let lowered = self.desugar(flowed)?;
        self.generate(lowered)?;
        Ok(())
    }
}
