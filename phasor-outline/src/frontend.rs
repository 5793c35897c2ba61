use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use phasor_core::Phase;
use phasor_pipeline::{Diagnostic, Diagnostics, Fault, Frontend, ParseError, SourceUnit, TypeDecl};

use crate::{
    BUILTIN_TYPES,
    error::OutlineError,
    source::{ParseFailures, parse_outline, read_outline, to_parse_error},
};

/// Reads outline files and pulls referenced supertypes in from a source
/// path.
#[derive(Debug, Default)]
pub struct OutlineFrontend {
    sourcepath: Vec<PathBuf>,
    failures: ParseFailures,
}

impl OutlineFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories searched for `<Type>.toml` when a supertype is not
    /// declared by any unit being entered.
    pub fn with_sourcepath(mut self, dirs: Vec<PathBuf>) -> Self {
        self.sourcepath = dirs;
        self
    }

    /// Handle to the outline errors this frontend reports.
    pub fn failures(&self) -> ParseFailures {
        self.failures.clone()
    }

    fn find_on_sourcepath(&self, name: &str) -> Option<PathBuf> {
        let top = name.split('.').next()?;
        self.sourcepath
            .iter()
            .map(|dir| dir.join(format!("{}.toml", top)))
            .find(|candidate| candidate.is_file())
    }
}

/// Supertype references in `decl`, paired with the qualified name of the
/// type that encloses the declaring type.
fn references(enclosing: Option<&str>, decl: &TypeDecl, out: &mut Vec<(Option<String>, String)>) {
    if let Some(extends) = &decl.extends {
        out.push((enclosing.map(str::to_string), extends.clone()));
    }
    let qualified = match enclosing {
        Some(outer) => format!("{}.{}", outer, decl.name),
        None => decl.name.clone(),
    };
    for nested in &decl.nested {
        references(Some(&qualified), nested, out);
    }
}

fn unit_references(unit: &SourceUnit, out: &mut Vec<(Option<String>, String)>) {
    for decl in unit.decls() {
        references(None, decl, out);
    }
}

impl Frontend for OutlineFrontend {
    fn parse(&mut self, path: &Path) -> Result<SourceUnit, ParseError> {
        tracing::debug!(path = %path.display(), "parse");
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                let error = OutlineError::Io {
                    path: path.to_path_buf(),
                    source: e,
                };
                let parse_error = to_parse_error(path, &error, None);
                self.failures.push(error);
                return Err(parse_error);
            }
        };
        match parse_outline(&content, &path.display().to_string()) {
            Ok(decls) => Ok(SourceUnit::new(path, decls)),
            Err(error) => {
                let parse_error = to_parse_error(path, &error, Some(&content));
                self.failures.push(*error);
                Err(parse_error)
            }
        }
    }

    fn enter(
        &mut self,
        units: &[&SourceUnit],
        log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, Fault> {
        let mut declared: HashSet<String> = units
            .iter()
            .flat_map(|unit| unit.declared_names())
            .collect();
        let mut pending = Vec::new();
        for unit in units {
            unit_references(unit, &mut pending);
        }

        let mut implicit = Vec::new();
        let mut tried: HashSet<PathBuf> = HashSet::new();
        while let Some((enclosing, name)) = pending.pop() {
            let sibling = enclosing.map(|outer| format!("{}.{}", outer, name));
            if sibling.is_some_and(|sibling| declared.contains(&sibling))
                || declared.contains(&name)
                || BUILTIN_TYPES.contains(&name.as_str())
            {
                continue;
            }
            let Some(path) = self.find_on_sourcepath(&name) else {
                continue;
            };
            if !tried.insert(path.clone()) {
                continue;
            }

            match read_outline(&path) {
                Ok(unit) => {
                    tracing::debug!(class = %name, path = %path.display(), "found on sourcepath");
                    declared.extend(unit.declared_names());
                    unit_references(&unit, &mut pending);
                    implicit.push(unit);
                }
                Err(error) => {
                    log.report(
                        Diagnostic::error(format!(
                            "cannot read implicit source for {}: {}",
                            name,
                            error.summary()
                        ))
                        .at(path.display().to_string())
                        .in_phase(Phase::Enter),
                    );
                    self.failures.push(*error);
                }
            }
        }
        Ok(implicit)
    }
}
