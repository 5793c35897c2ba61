//! The pipeline coordinator.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use phasor_core::{CompilerConfig, Phase, ProcMode};

use crate::{
    Backend, CompileOutcome, Diagnostic, Diagnostics, EmittedFile, EnvId, ExitStatus, Fault,
    Frontend, PhaseTracker, Processor, RoundFailure, Scheduler, SourceUnit, TaskEvent, TaskKind,
    TaskListener, Todo, UnitId, processing::Gate, toolchain::Toolchain,
};

/// Drives source units through the phase lattice.
///
/// A pipeline is built once per invocation and consumed by
/// [`compile`](Self::compile). Annotation processing may replace it with a
/// successor holding more units; the successor keeps the configuration,
/// collaborators, listeners and diagnostics of the pipeline it replaces.
///
/// # Example
///
/// ```ignore
/// let outcome = Pipeline::new(config, frontend, backend)
///     .listener(recorder.clone())
///     .compile(&sources, &[], processors);
///
/// std::process::exit(outcome.status.code());
/// ```
pub struct Pipeline {
    pub(crate) config: CompilerConfig,
    pub(crate) toolchain: Option<Toolchain>,
    pub(crate) log: Diagnostics,
    pub(crate) listeners: Vec<Arc<dyn TaskListener>>,
    pub(crate) units: Vec<SourceUnit>,
    pub(crate) roots: HashSet<UnitId>,
    pub(crate) tracker: PhaseTracker,
    pub(crate) todo: Todo,
    pub(crate) scheduler: Scheduler,
    pub(crate) gate: Gate,
    pub(crate) emitted: Vec<EmittedFile>,
    /// Set when entry pulled in units that were not given as sources.
    pub(crate) implicit_read: bool,
    /// Root units no processing round has looked at yet.
    pub(crate) fresh_units: Vec<UnitId>,
    /// Everything entry reported, handed to a successor.
    entry_reports: Vec<Diagnostic>,
    /// Entry diagnostics a predecessor already reported.
    replayed: Vec<Diagnostic>,
    closed: bool,
}

impl Pipeline {
    /// Create a pipeline with the given collaborators.
    pub fn new(
        config: CompilerConfig,
        frontend: impl Frontend + 'static,
        backend: impl Backend + 'static,
    ) -> Self {
        Self::with_toolchain(
            config,
            Toolchain {
                frontend: Box::new(frontend),
                backend: Box::new(backend),
            },
            Diagnostics::new(),
            Vec::new(),
            Gate::Idle,
        )
    }

    fn with_toolchain(
        config: CompilerConfig,
        toolchain: Toolchain,
        log: Diagnostics,
        listeners: Vec<Arc<dyn TaskListener>>,
        gate: Gate,
    ) -> Self {
        Self {
            config,
            toolchain: Some(toolchain),
            log,
            listeners,
            units: Vec::new(),
            roots: HashSet::new(),
            tracker: PhaseTracker::new(),
            todo: Todo::new(),
            scheduler: Scheduler::default(),
            gate,
            emitted: Vec::new(),
            implicit_read: false,
            fresh_units: Vec::new(),
            entry_reports: Vec::new(),
            replayed: Vec::new(),
            closed: false,
        }
    }

    /// Add a listener to receive task events.
    pub fn listener(mut self, listener: Arc<dyn TaskListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.log
    }

    pub fn error_count(&self) -> usize {
        self.log.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.log.warning_count()
    }

    pub fn tracker(&self) -> &PhaseTracker {
        &self.tracker
    }

    pub fn todo(&self) -> &Todo {
        &self.todo
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Every unit known to the pipeline, implicit ones included.
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units.get(id.index())
    }

    /// Returns true if the unit was given as a source or generated by
    /// annotation processing.
    pub fn is_root(&self, id: UnitId) -> bool {
        self.roots.contains(&id)
    }

    /// Returns true if this pipeline replaced another one during annotation
    /// processing.
    pub fn is_delegate(&self) -> bool {
        matches!(self.gate, Gate::Delegate)
    }

    /// Files generated so far.
    pub fn emitted(&self) -> &[EmittedFile] {
        &self.emitted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns true if work for `phase` should be skipped.
    ///
    /// With `stop_after` set, only phases after it are skipped, whatever
    /// the error count. Otherwise any error stops everything.
    pub fn should_stop(&self, phase: Phase) -> bool {
        match self.config.stop_after {
            Some(limit) => phase.is_after(limit),
            None => self.log.has_errors(),
        }
    }

    pub(crate) fn stop_if<T>(&self, phase: Phase, results: Vec<T>) -> Vec<T> {
        if self.should_stop(phase) {
            Vec::new()
        } else {
            results
        }
    }

    pub(crate) fn notify_started(&self, event: &TaskEvent) {
        for listener in &self.listeners {
            listener.started(event);
        }
    }

    pub(crate) fn notify_finished(&self, event: &TaskEvent) {
        for listener in &self.listeners {
            listener.finished(event);
        }
    }

    /// Compile `sources` and close the pipeline.
    ///
    /// `class_names` name already entered types that annotation processing
    /// should see in its first round. Processors only run when processing
    /// is not disabled in the configuration.
    pub fn compile(
        mut self,
        sources: &[PathBuf],
        class_names: &[String],
        processors: Vec<Box<dyn Processor>>,
    ) -> CompileOutcome {
        tracing::info!(
            tool = %self.config.tool,
            policy = %self.config.policy,
            sources = sources.len(),
            "compiling"
        );

        self.init_round(processors);
        match self.drive(sources, class_names) {
            Ok(pipeline) => pipeline.finish(None),
            Err(failure) => {
                let RoundFailure { pipeline, fault } = failure;
                (*pipeline).finish(Some(fault))
            }
        }
    }

    fn drive(mut self, sources: &[PathBuf], class_names: &[String]) -> Result<Self, RoundFailure> {
        if let Err(fault) = self.read_sources(sources) {
            return Err(RoundFailure::new(self, fault));
        }

        let mut pipeline = self.run_round(class_names)?;
        pipeline.mark_processed();

        if pipeline.config.proc == ProcMode::Only {
            tracing::debug!("stopping after annotation processing");
            return Ok(pipeline);
        }

        match pipeline.compile_queue() {
            Ok(()) => Ok(pipeline),
            Err(fault) => Err(RoundFailure::new(pipeline, fault)),
        }
    }

    fn read_sources(&mut self, sources: &[PathBuf]) -> Result<(), Fault> {
        let units = self.parse_files(sources)?;
        self.enter_trees(&units)?;
        Ok(())
    }

    fn finish(mut self, fault: Option<Fault>) -> CompileOutcome {
        if let Some(fault) = &fault {
            tracing::error!(error = %fault, "compilation ended early");
            self.log
                .report(Diagnostic::error(fault.to_string()).category(fault.category()));
        }

        if self.config.werror && !self.log.has_errors() && self.log.has_warnings() {
            self.log
                .report(Diagnostic::error("warnings found and werror specified"));
        }

        let status = match &fault {
            Some(fault) => fault.exit_status(),
            None if self.log.has_errors() => ExitStatus::Error,
            None => ExitStatus::Ok,
        };

        tracing::info!(
            ?status,
            errors = self.log.error_count(),
            warnings = self.log.warning_count(),
            "compilation finished"
        );

        self.close();
        CompileOutcome {
            status,
            diagnostics: std::mem::take(&mut self.log),
            emitted: std::mem::take(&mut self.emitted),
            fault,
        }
    }

    /// Parse source files and add them as roots.
    ///
    /// A file that fails to parse is reported and kept as an empty unit.
    /// Files already known are not parsed again.
    pub fn parse_files(&mut self, paths: &[PathBuf]) -> Result<Vec<UnitId>, Fault> {
        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(existing) = self.find_unit(path) {
                ids.push(existing);
                continue;
            }

            if self.toolchain.is_none() {
                return Err(Fault::Closed);
            }
            let event = TaskEvent::on(TaskKind::Parse, path.display().to_string());
            self.notify_started(&event);

            let parsed = match self.toolchain.as_mut() {
                Some(toolchain) => toolchain.frontend.parse(path),
                None => return Err(Fault::Closed),
            };
            let unit = match parsed {
                Ok(unit) => unit,
                Err(err) => {
                    let location = err
                        .location
                        .unwrap_or_else(|| path.display().to_string());
                    self.log.report(
                        Diagnostic::error(err.message)
                            .in_phase(Phase::Parse)
                            .at(location),
                    );
                    SourceUnit::empty(path)
                }
            };

            self.notify_finished(&event);
            ids.push(self.add_root(unit));
        }
        Ok(ids)
    }

    /// Add a parsed unit as a root. A unit with an origin already known is
    /// not added twice.
    pub fn add_root(&mut self, unit: SourceUnit) -> UnitId {
        if let Some(existing) = self.find_unit(unit.origin()) {
            self.roots.insert(existing);
            return existing;
        }
        let id = UnitId(self.units.len() as u32);
        self.units.push(unit);
        self.roots.insert(id);
        self.fresh_units.push(id);
        id
    }

    fn find_unit(&self, origin: &Path) -> Option<UnitId> {
        self.units
            .iter()
            .position(|unit| unit.origin() == origin)
            .map(|index| UnitId(index as u32))
    }

    /// Enter the symbols of `ids` and queue their top-level environments.
    ///
    /// Units the frontend reads implicitly are entered too, as non-roots.
    /// Returns the environments created, nested ones excluded.
    pub fn enter_trees(&mut self, ids: &[UnitId]) -> Result<Vec<EnvId>, Fault> {
        if self.toolchain.is_none() {
            return Err(Fault::Closed);
        }
        let event = TaskEvent::new(TaskKind::Enter);
        self.notify_started(&event);

        let mut pending: Vec<UnitId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !pending.contains(id) && id.index() < self.units.len() {
                pending.push(*id);
            }
        }

        let mut log = Diagnostics::new();
        let entered = self.enter_units(pending, &mut log);
        self.merge_entry_reports(log);

        self.notify_finished(&event);
        entered
    }

    fn enter_units(
        &mut self,
        mut pending: Vec<UnitId>,
        log: &mut Diagnostics,
    ) -> Result<Vec<EnvId>, Fault> {
        let units: Vec<&SourceUnit> = pending.iter().map(|id| &self.units[id.index()]).collect();
        let implicit = match self.toolchain.as_mut() {
            Some(toolchain) => toolchain.frontend.enter(&units, log)?,
            None => return Err(Fault::Closed),
        };

        for unit in implicit {
            if self.find_unit(unit.origin()).is_some() {
                continue;
            }
            tracing::debug!(origin = %unit.origin().display(), "read implicitly");
            pending.push(UnitId(self.units.len() as u32));
            self.units.push(unit);
            self.implicit_read = true;
        }

        let mut entered = Vec::new();
        for id in pending {
            let unit = &self.units[id.index()];
            for decl in unit.decls() {
                if let Some(env) = self.tracker.register(id, unit.origin(), decl, None, log) {
                    self.todo.add(self.tracker.env(env));
                    entered.push(env);
                }
            }
        }
        Ok(entered)
    }

    /// Report what entry raised, minus what a predecessor pipeline already
    /// reported for the same units.
    fn merge_entry_reports(&mut self, log: Diagnostics) {
        for diagnostic in log.iter() {
            self.entry_reports.push(diagnostic.clone());
            match self.replayed.iter().position(|seen| seen == diagnostic) {
                Some(index) => {
                    self.replayed.swap_remove(index);
                }
                None => self.log.report(diagnostic.clone()),
            }
        }
    }

    /// Record that every entered environment has been through annotation
    /// processing.
    pub fn mark_processed(&mut self) {
        let top_level: Vec<EnvId> = self
            .tracker
            .iter()
            .filter(|env| env.is_top_level())
            .map(|env| env.id())
            .collect();
        for id in top_level {
            self.tracker.advance(id, Phase::Process);
        }
    }

    /// Build the pipeline that continues after a processing round produced
    /// `generated`.
    ///
    /// The successor holds this pipeline's roots plus the generated units,
    /// entered afresh. Implicitly read units are read again by entry.
    /// Entry diagnostics this pipeline already reported are not repeated.
    pub(crate) fn successor(self, generated: Vec<SourceUnit>) -> Result<Pipeline, RoundFailure> {
        let Pipeline {
            config,
            toolchain,
            log,
            listeners,
            units,
            roots,
            emitted,
            entry_reports,
            ..
        } = self;

        let Some(toolchain) = toolchain else {
            let mut closed = Pipeline::detached(config, log, listeners);
            closed.emitted = emitted;
            return Err(RoundFailure::new(closed, Fault::Closed));
        };

        tracing::debug!(
            roots = roots.len(),
            generated = generated.len(),
            "handing off to successor pipeline"
        );

        let mut next = Pipeline::with_toolchain(config, toolchain, log, listeners, Gate::Delegate);
        next.emitted = emitted;
        next.replayed = entry_reports;

        for (index, unit) in units.into_iter().enumerate() {
            if roots.contains(&UnitId(index as u32)) {
                next.add_root(unit);
            }
        }
        next.fresh_units.clear();
        for unit in generated {
            next.add_root(unit);
        }

        let all: Vec<UnitId> = (0..next.units.len() as u32).map(UnitId).collect();
        match next.enter_trees(&all) {
            Ok(_) => Ok(next),
            Err(fault) => Err(RoundFailure::new(next, fault)),
        }
    }

    fn detached(
        config: CompilerConfig,
        log: Diagnostics,
        listeners: Vec<Arc<dyn TaskListener>>,
    ) -> Self {
        Self {
            config,
            toolchain: None,
            log,
            listeners,
            units: Vec::new(),
            roots: HashSet::new(),
            tracker: PhaseTracker::new(),
            todo: Todo::new(),
            scheduler: Scheduler::default(),
            gate: Gate::Finished,
            emitted: Vec::new(),
            implicit_read: false,
            fresh_units: Vec::new(),
            entry_reports: Vec::new(),
            replayed: Vec::new(),
            closed: true,
        }
    }

    /// Release the queue, environments, caches, processing state and
    /// collaborators.
    ///
    /// Diagnostics stay readable. Calling this more than once does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(toolchain) = self.toolchain.take() {
            toolchain.close();
        }
        self.gate = Gate::Finished;
        self.todo.clear();
        self.tracker.clear();
        self.scheduler.clear();
        self.units.clear();
        self.roots.clear();
        self.fresh_units.clear();
    }
}
