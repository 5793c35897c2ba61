mod check;
mod compile;
mod completions;
mod phases;

use std::path::{Path, PathBuf};

use check::CheckCommand;
use clap::{Args, Parser, Subcommand};
use compile::CompileCommand;
use completions::CompletionsCommand;
use eyre::Result;
use phasor_core::{ImplicitSourcePolicy, ProcMode, Project, ProjectFile, ToolInfo};
use phasor_pipeline::ExitStatus;
use phases::PhasesCommand;

const DEFAULT_CONFIG: &str = "phasor.toml";

/// Extension trait for exiting on project file errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for phasor_core::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(ExitStatus::CmdErr.code());
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "phasor")]
#[command(version)]
#[command(about = "Compile TOML type outlines through the phasor pipeline")]
pub(crate) struct Cli {
    /// Log pipeline progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn init_tracing(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };
        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Compile(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::Phases(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile outline sources and write class files
    Compile(CompileCommand),

    /// Attribute and flow-check outline sources without writing anything
    Check(CheckCommand),

    /// List the phase lattice and the compile policies
    Phases(PhasesCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Arguments shared by `compile` and `check`.
#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// Source files to compile (replaces `paths.sources` from the project file)
    pub sources: Vec<PathBuf>,

    /// Path to phasor.toml (defaults to ./phasor.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory searched for referenced types (repeatable)
    #[arg(long = "sourcepath", value_name = "DIR")]
    pub sourcepath: Vec<PathBuf>,

    /// What happens to implicitly read types: none or class
    #[arg(long)]
    pub implicit: Option<ImplicitSourcePolicy>,

    /// Annotation processing: default, none or only
    #[arg(long)]
    pub proc: Option<ProcMode>,

    /// Type to hand to annotation processing as a root (repeatable)
    #[arg(long = "class", value_name = "NAME")]
    pub class_names: Vec<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub werror: bool,

    /// Write the task trace as events.json to this directory
    #[arg(long, value_name = "DIR")]
    pub trace_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// Load the project file, then apply the flags on top of it.
    pub fn project(&self) -> Project {
        let mut project = match &self.config {
            Some(path) => ProjectFile::open(path).unwrap_or_exit().into_project(),
            None if Path::new(DEFAULT_CONFIG).is_file() => {
                ProjectFile::open(DEFAULT_CONFIG).unwrap_or_exit().into_project()
            }
            None => Project::default(),
        };
        self.apply(&mut project);
        project
    }

    fn apply(&self, project: &mut Project) {
        let compiler = &mut project.compiler;
        compiler.tool = ToolInfo::new("phasor", env!("CARGO_PKG_VERSION"));
        if let Some(implicit) = self.implicit {
            compiler.implicit = implicit;
        }
        if let Some(proc) = self.proc {
            compiler.proc = proc;
        }
        if self.werror {
            compiler.werror = true;
        }

        let paths = &mut project.paths;
        if !self.sources.is_empty() {
            paths.sources = self.sources.clone();
        }
        paths.sourcepath.extend(self.sourcepath.iter().cloned());
    }
}

/// Exit with a command-line error.
pub(crate) fn usage_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    std::process::exit(ExitStatus::CmdErr.code());
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use phasor_core::{CompilePolicy, Phase};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("phasor").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compile_flags_override_project() {
        let cli = parse(&[
            "compile",
            "A.toml",
            "--policy",
            "byfile",
            "--implicit",
            "none",
            "--stop-after",
            "flow",
            "--sourcepath",
            "lib",
            "--werror",
        ]);
        let Commands::Compile(cmd) = cli.command else {
            panic!("expected compile");
        };

        let mut project: Project = r#"
            [compiler]
            policy = "simple"
            implicit = "class"

            [paths]
            sources = ["B.toml"]
            sourcepath = ["vendor"]
        "#
        .parse()
        .unwrap();
        cmd.apply(&mut project);

        assert_eq!(project.compiler.policy, CompilePolicy::ByFile);
        assert_eq!(project.compiler.implicit, ImplicitSourcePolicy::None);
        assert_eq!(project.compiler.stop_after, Some(Phase::Flow));
        assert!(project.compiler.werror);
        assert_eq!(project.paths.sources, vec![PathBuf::from("A.toml")]);
        assert_eq!(
            project.paths.sourcepath,
            vec![PathBuf::from("vendor"), PathBuf::from("lib")]
        );
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = Cli::try_parse_from(["phasor", "compile", "--policy", "fast", "A.toml"]);
        assert!(result.is_err());
    }
}
