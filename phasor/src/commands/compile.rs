use std::path::PathBuf;

use clap::Args;
use eyre::Result;
use phasor_core::{CompilePolicy, Phase, Project};

use super::{SourceArgs, usage_error};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

const DEFAULT_OUT_DIR: &str = "out";

#[derive(Args, Debug)]
pub struct CompileCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// How the work queue is drained: attr, check, simple, byfile or bytodo
    #[arg(long)]
    pub policy: Option<CompilePolicy>,

    /// Stop after this phase, even when there are errors
    #[arg(long, value_name = "PHASE")]
    pub stop_after: Option<Phase>,

    /// Where class files are written (defaults to ./out)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

impl CompileCommand {
    pub fn run(&self) -> Result<()> {
        let mut project = self.source.project();
        self.apply(&mut project);
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

    pub(super) fn apply(&self, project: &mut Project) {
        self.source.apply(project);
        if let Some(policy) = self.policy {
            project.compiler.policy = policy;
        }
        if let Some(phase) = self.stop_after {
            project.compiler.stop_after = Some(phase);
        }
        if let Some(out_dir) = &self.out_dir {
            project.paths.out_dir = Some(out_dir.clone());
        }
        if project.paths.out_dir.is_none() {
            project.paths.out_dir = Some(PathBuf::from(DEFAULT_OUT_DIR));
        }
    }
}
