//! Compile operation - run the pipeline over outline sources.

use std::{path::Path, sync::Arc};

use eyre::{Context, Result};
use phasor_core::Project;
use phasor_outline::{BuilderProcessor, OutlineBackend, OutlineFrontend};
use phasor_pipeline::{EventRecorder, Pipeline, Processor};

use crate::reports::CompileReport;

/// Execute the compile operation.
///
/// Runs one pipeline with the outline toolchain and the builder processor,
/// and optionally writes the task trace to `trace_dir`.
pub fn compile(
    project: &Project,
    class_names: &[String],
    trace_dir: Option<&Path>,
) -> Result<CompileReport> {
    let frontend = OutlineFrontend::new().with_sourcepath(project.paths.sourcepath.clone());
    let failures = frontend.failures();
    let backend = match &project.paths.out_dir {
        Some(out_dir) => OutlineBackend::new().with_out_dir(out_dir),
        None => OutlineBackend::new(),
    };
    let processors: Vec<Box<dyn Processor>> = vec![Box::new(BuilderProcessor::default())];

    let mut pipeline = Pipeline::new(project.compiler.clone(), frontend, backend);
    let recorder = Arc::new(EventRecorder::new());
    if trace_dir.is_some() {
        pipeline = pipeline.listener(recorder.clone());
    }

    let outcome = pipeline.compile(&project.paths.sources, class_names, processors);

    if let Some(dir) = trace_dir {
        recorder
            .write_to_dir(dir)
            .wrap_err_with(|| format!("failed to write task trace to {}", dir.display()))?;
    }

    let source_errors = failures
        .take()
        .into_iter()
        .map(|error| format!("{:?}", miette::Report::new(error)))
        .collect();

    Ok(CompileReport {
        tool: project.compiler.tool.clone(),
        outcome,
        source_errors,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use phasor_core::CompilePolicy;
    use phasor_pipeline::ExitStatus;
    use tempfile::TempDir;

    use super::*;

    fn project_in(dir: &TempDir, sources: &[(&str, &str)]) -> Project {
        let mut project = Project::default();
        for (name, content) in sources {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            project.paths.sources.push(path);
        }
        project.paths.out_dir = Some(dir.path().join("out"));
        project
    }

    #[test]
    fn test_compile_writes_classes_and_trace() {
        let dir = TempDir::new().unwrap();
        let project = project_in(&dir, &[("A.toml", "[[type]]\nname = \"A\"\n")]);
        let trace_dir = dir.path().join("trace");

        let report = compile(&project, &[], Some(&trace_dir)).unwrap();

        assert_eq!(report.status(), ExitStatus::Ok);
        assert!(dir.path().join("out/A.json").is_file());
        assert!(trace_dir.join("events.json").is_file());
        assert!(report.source_errors.is_empty());
    }

    #[test]
    fn test_parse_failures_are_rendered() {
        let dir = TempDir::new().unwrap();
        let project = project_in(&dir, &[("Broken.toml", "[[type]]\nname = \n")]);

        let report = compile(&project, &[], None).unwrap();

        assert_eq!(report.status(), ExitStatus::Error);
        assert_eq!(report.source_errors.len(), 1);
        assert!(report.source_errors[0].contains("failed to parse outline"));
    }

    #[test]
    fn test_check_policy_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut project = project_in(&dir, &[("A.toml", "[[type]]\nname = \"A\"\n")]);
        project.compiler.policy = CompilePolicy::CheckOnly;

        let report = compile(&project, &[], None).unwrap();

        assert_eq!(report.status(), ExitStatus::Ok);
        assert!(report.outcome.emitted.is_empty());
        assert!(!dir.path().join("out").exists());
    }
}
