//! Compiler configuration and the `phasor.toml` project file.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::{
    CompilePolicy, Error, ImplicitSourcePolicy, Phase, ProcMode, Result, error::SourceContext,
};

/// Name and version of the tool driving a pipeline.
///
/// Injected through [`CompilerConfig`] so that logs and failure reports can
/// name the compiler without reaching for process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self::new("phasor", env!("CARGO_PKG_VERSION"))
    }
}

impl fmt::Display for ToolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Settings for one pipeline instance.
///
/// Read from the `[compiler]` table of `phasor.toml`; every field can be
/// overridden from the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// How the work queue is drained.
    pub policy: CompilePolicy,
    /// Whether implicitly read types are generated.
    pub implicit: ImplicitSourcePolicy,
    /// Turn a warning-only compilation into a failed one.
    pub werror: bool,
    /// Stop every phase strictly after this one, whatever the error count.
    pub stop_after: Option<Phase>,
    /// Whether annotation processing runs.
    pub proc: ProcMode,
    #[serde(skip)]
    pub tool: ToolInfo,
}

impl CompilerConfig {
    /// Set the compile policy.
    pub fn with_policy(mut self, policy: CompilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the implicit source policy.
    pub fn with_implicit(mut self, implicit: ImplicitSourcePolicy) -> Self {
        self.implicit = implicit;
        self
    }

    /// Enable or disable treating warnings as errors.
    pub fn with_werror(mut self, werror: bool) -> Self {
        self.werror = werror;
        self
    }

    /// Stop after the given phase regardless of errors.
    pub fn with_stop_after(mut self, phase: Phase) -> Self {
        self.stop_after = Some(phase);
        self
    }

    /// Set the annotation processing mode.
    pub fn with_proc(mut self, proc: ProcMode) -> Self {
        self.proc = proc;
        self
    }

    /// Set the tool identity.
    pub fn with_tool(mut self, tool: ToolInfo) -> Self {
        self.tool = tool;
        self
    }
}

/// Input and output locations, from the `[paths]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Source units compiled as roots.
    pub sources: Vec<PathBuf>,
    /// Directories searched for types referenced but not listed in `sources`.
    pub sourcepath: Vec<PathBuf>,
    /// Where generated classes are written.
    pub out_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Make every relative path relative to `base` instead of the
    /// current directory.
    pub fn resolve_against(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.sources.iter_mut().for_each(join);
        self.sourcepath.iter_mut().for_each(join);
        if let Some(out) = self.out_dir.as_mut() {
            join(out);
        }
    }
}

/// Root schema for `phasor.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    pub compiler: CompilerConfig,
    pub paths: PathsConfig,
}

impl FromStr for Project {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Project::from_str_with_filename(s, "phasor.toml")
    }
}

impl Project {
    /// Parse a project from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        let ctx = SourceContext::new(content, filename);
        let project: Project = toml::from_str(content).map_err(|e| ctx.parse_error(e))?;
        project.validate(&ctx)?;
        Ok(project)
    }

    fn validate(&self, ctx: &SourceContext) -> Result<()> {
        let mut seen = HashSet::new();
        for source in &self.paths.sources {
            if !seen.insert(source) {
                let shown = source.display().to_string();
                return Err(ctx.validation_error(format!("duplicate source '{}'", shown), &shown));
            }
        }
        Ok(())
    }
}

/// A `phasor.toml` file on disk, with paths resolved against its directory.
pub struct ProjectFile {
    path: PathBuf,
    project: Project,
}

impl ProjectFile {
    /// Open and parse a project file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Box::new(Error::Io {
                path: path.clone(),
                source: e,
            })
        })?;
        let filename = path.display().to_string();
        let mut project = Project::from_str_with_filename(&content, &filename)?;
        if let Some(base) = path.parent() {
            project.paths.resolve_against(base);
        }
        Ok(Self { path, project })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the parsed project.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Consume the file, keeping the project.
    pub fn into_project(self) -> Project {
        self.project
    }
}
