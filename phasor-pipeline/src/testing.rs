//! Scripted collaborators for exercising the pipeline.
//!
//! Every collaborator records what it was asked to do in a shared
//! [`CallLog`], so tests can assert on ordering across the frontend,
//! backend and processors.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use phasor_core::Phase;

use crate::{
    Artifact, Backend, Diagnostic, Diagnostics, EmittedFile, EnvRef, Fault, Frontend, ParseError,
    Processor, ProcessorError, Round, SourceUnit, TypeDecl,
};

/// Calls recorded by the scripted collaborators, rendered as
/// `kind(subject)`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.into());
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Calls starting with `prefix`, e.g. `"desugar("`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Number of times `call` was recorded.
    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Index of the first occurrence of `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }
}

/// A frontend serving units from memory.
///
/// Sources are looked up by path. Library units stand in for a source
/// path: entering a unit whose supertype is not declared anywhere pulls in
/// the library unit registered under that type name.
#[derive(Debug, Default)]
pub struct ScriptedFrontend {
    calls: CallLog,
    sources: HashMap<PathBuf, Vec<TypeDecl>>,
    library: HashMap<String, SourceUnit>,
    failing: HashMap<PathBuf, String>,
}

impl ScriptedFrontend {
    pub fn new(calls: &CallLog) -> Self {
        Self {
            calls: calls.clone(),
            ..Self::default()
        }
    }

    /// Serve `decls` when `path` is parsed.
    pub fn source(mut self, path: impl Into<PathBuf>, decls: Vec<TypeDecl>) -> Self {
        self.sources.insert(path.into(), decls);
        self
    }

    /// Make `decl` available as an implicitly read unit.
    pub fn library(mut self, decl: TypeDecl) -> Self {
        let origin = PathBuf::from(format!("lib/{}.toml", decl.name));
        self.library
            .insert(decl.name.clone(), SourceUnit::new(origin, vec![decl]));
        self
    }

    /// Fail to parse `path` with `message`.
    pub fn failing(mut self, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.failing.insert(path.into(), message.into());
        self
    }
}

fn supertypes(decl: &TypeDecl, out: &mut Vec<String>) {
    if let Some(extends) = &decl.extends {
        out.push(extends.clone());
    }
    for nested in &decl.nested {
        supertypes(nested, out);
    }
}

impl Frontend for ScriptedFrontend {
    fn parse(&mut self, path: &Path) -> Result<SourceUnit, ParseError> {
        self.calls.record(format!("parse({})", path.display()));
        if let Some(message) = self.failing.get(path) {
            return Err(ParseError::new(message.clone()).at(format!("{}:1:1", path.display())));
        }
        match self.sources.get(path) {
            Some(decls) => Ok(SourceUnit::new(path, decls.clone())),
            None => Err(ParseError::new(format!("file not found: {}", path.display()))),
        }
    }

    fn enter(
        &mut self,
        units: &[&SourceUnit],
        _log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, Fault> {
        self.calls.record(format!("enter({})", units.len()));

        let mut declared: HashSet<String> = units
            .iter()
            .flat_map(|unit| unit.declared_names())
            .collect();
        let mut pending: Vec<String> = Vec::new();
        for unit in units {
            for decl in unit.decls() {
                supertypes(decl, &mut pending);
            }
        }

        let mut implicit = Vec::new();
        while let Some(name) = pending.pop() {
            if declared.contains(&name) {
                continue;
            }
            if let Some(unit) = self.library.get(&name) {
                declared.extend(unit.declared_names());
                for decl in unit.decls() {
                    supertypes(decl, &mut pending);
                }
                implicit.push(unit.clone());
            }
        }
        Ok(implicit)
    }

    fn close(&mut self) {
        self.calls.record("close(frontend)");
    }
}

/// A backend that follows a script of failures.
///
/// Desugaring aborts if the supertype of the environment has not been
/// flowed, so any ordering mistake surfaces as an abnormal exit.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    calls: CallLog,
    attr_errors: HashSet<String>,
    attr_warnings: HashSet<String>,
    incomplete: HashSet<String>,
    aborts: HashSet<String>,
}

impl ScriptedBackend {
    pub fn new(calls: &CallLog) -> Self {
        Self {
            calls: calls.clone(),
            ..Self::default()
        }
    }

    /// Report an attribution error for `class`.
    pub fn attr_error(mut self, class: impl Into<String>) -> Self {
        self.attr_errors.insert(class.into());
        self
    }

    /// Report an attribution warning for `class`.
    pub fn attr_warning(mut self, class: impl Into<String>) -> Self {
        self.attr_warnings.insert(class.into());
        self
    }

    /// Fail to complete `class` during attribution.
    pub fn incomplete(mut self, class: impl Into<String>) -> Self {
        self.incomplete.insert(class.into());
        self
    }

    /// Abort while desugaring `class`.
    pub fn abort_on(mut self, class: impl Into<String>) -> Self {
        self.aborts.insert(class.into());
        self
    }
}

fn lower(env: EnvRef<'_>, out: &mut Vec<Artifact>) {
    out.push(Artifact::new(env.flat_name(), env.id(), env.members().to_vec()));
    for nested in env.nested_envs() {
        lower(nested, out);
    }
}

fn check_supertypes_flowed(env: EnvRef<'_>) -> Result<(), Fault> {
    if let Some(supertype) = env.supertype() {
        if supertype.phase().is_none_or(|phase| phase < Phase::Flow) {
            return Err(Fault::abort(format!(
                "{} desugared before its supertype {} was flowed",
                env.name(),
                supertype.name()
            )));
        }
    }
    for nested in env.nested_envs() {
        check_supertypes_flowed(nested)?;
    }
    Ok(())
}

impl Backend for ScriptedBackend {
    fn attribute(&mut self, env: EnvRef<'_>, log: &mut Diagnostics) -> Result<(), Fault> {
        self.calls.record(format!("attribute({})", env.name()));
        if self.incomplete.contains(env.name()) {
            return Err(Fault::completion(env.name(), "class file is incomplete"));
        }
        if self.attr_errors.contains(env.name()) {
            log.report(
                Diagnostic::error(format!("incompatible types in {}", env.name()))
                    .in_phase(Phase::Attr),
            );
        }
        if self.attr_warnings.contains(env.name()) {
            log.report(
                Diagnostic::warning(format!("unchecked conversion in {}", env.name()))
                    .in_phase(Phase::Attr),
            );
        }
        Ok(())
    }

    fn flow(&mut self, env: EnvRef<'_>, _log: &mut Diagnostics) -> Result<(), Fault> {
        self.calls.record(format!("flow({})", env.name()));
        Ok(())
    }

    fn desugar(&mut self, env: EnvRef<'_>, _log: &mut Diagnostics) -> Result<Vec<Artifact>, Fault> {
        self.calls.record(format!("desugar({})", env.name()));
        if self.aborts.contains(env.name()) {
            return Err(Fault::abort(format!("cannot lower {}", env.name())));
        }
        check_supertypes_flowed(env)?;

        let mut artifacts = Vec::new();
        lower(env, &mut artifacts);
        Ok(artifacts)
    }

    fn generate(
        &mut self,
        _env: EnvRef<'_>,
        artifact: &Artifact,
        _log: &mut Diagnostics,
    ) -> Result<Option<EmittedFile>, Fault> {
        self.calls.record(format!("generate({})", artifact.class_name));
        Ok(Some(EmittedFile {
            class_name: artifact.class_name.clone(),
            path: PathBuf::from(format!("out/{}.class", artifact.class_name)),
        }))
    }

    fn close(&mut self) {
        self.calls.record("close(backend)");
    }
}

/// A processor that generates `<Name>Builder` for every root type carrying
/// its annotation.
#[derive(Debug)]
pub struct ScriptedProcessor {
    calls: CallLog,
    annotation: String,
    fail: Option<String>,
    panic: bool,
    late: Option<String>,
    noisy: bool,
}

impl ScriptedProcessor {
    pub fn new(calls: &CallLog, annotation: impl Into<String>) -> Self {
        Self {
            calls: calls.clone(),
            annotation: annotation.into(),
            fail: None,
            panic: false,
            late: None,
            noisy: false,
        }
    }

    /// Return an error from every round.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// Panic in every round.
    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    /// Generate a type named `name` in the final round.
    pub fn generating_late(mut self, name: impl Into<String>) -> Self {
        self.late = Some(name.into());
        self
    }

    /// Report a warning for every unit generated.
    pub fn noisy(mut self) -> Self {
        self.noisy = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Processor> {
        Box::new(self)
    }
}

impl Processor for ScriptedProcessor {
    fn name(&self) -> &str {
        "scripted"
    }

    fn process(
        &mut self,
        round: &Round<'_>,
        log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, ProcessorError> {
        let names: Vec<&str> = round.elements.iter().map(|env| env.name()).collect();
        let mut call = format!("process({}", round.number);
        if round.last {
            call.push_str(" last");
        }
        if !names.is_empty() {
            call.push_str(": ");
            call.push_str(&names.join(", "));
        }
        call.push(')');
        self.calls.record(call);

        if let Some(message) = &self.fail {
            return Err(ProcessorError::new(message.clone()));
        }
        if self.panic {
            panic!("processor blew up");
        }

        let generated: Vec<String> = if round.last {
            self.late.iter().cloned().collect()
        } else {
            round
                .annotated_with(&self.annotation)
                .map(|env| format!("{}Builder", env.name()))
                .collect()
        };

        Ok(generated
            .into_iter()
            .map(|name| {
                if self.noisy {
                    log.warning(format!("generated {}", name));
                }
                SourceUnit::new(
                    format!("generated/{}.toml", name),
                    vec![TypeDecl::new(name).with_member("build")],
                )
            })
            .collect())
    }
}
