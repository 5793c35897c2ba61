//! End-to-end scenarios driven through scripted collaborators.


use std::path::PathBuf;

use phasor_core::{CompilePolicy, CompilerConfig};

use crate::{
    CompileOutcome, Pipeline, Processor, TypeDecl,
    testing::{CallLog, ScriptedBackend, ScriptedFrontend},
};

fn sources(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

fn config(policy: CompilePolicy) -> CompilerConfig {
    CompilerConfig::default().with_policy(policy)
}

/// `A.toml` declaring `A`, and `B.toml` declaring `B`.
fn two_files(calls: &CallLog) -> ScriptedFrontend {
    ScriptedFrontend::new(calls)
        .source("A.toml", vec![TypeDecl::new("A").with_member("run")])
        .source("B.toml", vec![TypeDecl::new("B")])
}

/// `Sub.toml` declaring `Sub extends Base`, and `Base.toml` declaring `Base`.
fn sub_and_base(calls: &CallLog) -> ScriptedFrontend {
    ScriptedFrontend::new(calls)
        .source("Sub.toml", vec![TypeDecl::new("Sub").extending("Base")])
        .source("Base.toml", vec![TypeDecl::new("Base").with_member("id")])
}

fn compile(
    config: CompilerConfig,
    frontend: ScriptedFrontend,
    backend: ScriptedBackend,
    files: &[&str],
) -> CompileOutcome {
    compile_with(config, frontend, backend, files, &[], Vec::new())
}

fn compile_with(
    config: CompilerConfig,
    frontend: ScriptedFrontend,
    backend: ScriptedBackend,
    files: &[&str],
    class_names: &[&str],
    processors: Vec<Box<dyn Processor>>,
) -> CompileOutcome {
    let class_names: Vec<String> = class_names.iter().map(|name| name.to_string()).collect();
    Pipeline::new(config, frontend, backend).compile(&sources(files), &class_names, processors)
}

fn messages(outcome: &CompileOutcome) -> Vec<String> {
    outcome
        .diagnostics
        .iter()
        .map(|diag| diag.message.clone())
        .collect()
}
