use clap::Args;
use eyre::Result;
use phasor_core::CompilePolicy;

use super::{SourceArgs, usage_error};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let mut project = self.source.project();
        project.compiler.policy = CompilePolicy::CheckOnly;
        project.compiler.stop_after = None;
        project.paths.out_dir = None;
        if project.paths.sources.is_empty() {
            usage_error("no source files");
        }

        let report = ops::compile(
            &project,
            &self.source.class_names,
            self.source.trace_dir.as_deref(),
        )?;
        report.render(&mut TerminalOutput::new());

        let status = report.status();
        if !status.is_ok() {
            std::process::exit(status.code());
        }
        Ok(())
    }
}
