use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
};

use phasor_core::Phase;
use phasor_pipeline::{Artifact, Backend, Diagnostic, Diagnostics, EmittedFile, EnvId, EnvRef, Fault};
use serde::Serialize;

use crate::{BUILTIN_TYPES, source::is_method};

/// A generated class file.
#[derive(Debug, Serialize)]
struct ClassFile<'a> {
    class: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    extends: Option<&'a str>,
    members: &'a [String],
}

/// Checks outline types, lowers them and writes one JSON file per class.
#[derive(Debug, Default)]
pub struct OutlineBackend {
    out_dir: Option<PathBuf>,
    /// Accessors synthesized by flow, per environment.
    accessors: HashMap<EnvId, Vec<String>>,
    /// Binary supertype name of every lowered class.
    supertypes: HashMap<EnvId, String>,
}

impl OutlineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write classes below `dir`. Without an output directory nothing is
    /// written.
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    fn attribute_one(&self, env: EnvRef<'_>, log: &mut Diagnostics) {
        let location = env.origin().display().to_string();
        let report = |log: &mut Diagnostics, diagnostic: Diagnostic| {
            log.report(diagnostic.at(location.clone()).in_phase(Phase::Attr));
        };

        if let Some(extends) = env.extends() {
            match env.supertype() {
                Some(supertype) if supertype.id() == env.id() => report(
                    log,
                    Diagnostic::error(format!("{} cannot extend itself", env.name())),
                ),
                Some(supertype) if supertype.is_deprecated() => report(
                    log,
                    Diagnostic::warning(format!(
                        "{} extends deprecated type {}",
                        env.name(),
                        extends
                    )),
                ),
                Some(_) => {}
                None if BUILTIN_TYPES.contains(&extends) => {}
                None => report(
                    log,
                    Diagnostic::error(format!("cannot find symbol: class {}", extends)),
                ),
            }
        }

        let mut seen = HashSet::new();
        for member in env.members() {
            if !seen.insert(member.as_str()) {
                report(
                    log,
                    Diagnostic::error(format!("{} is already defined in {}", member, env.name())),
                );
            }
        }
    }

    fn flow_one(&mut self, env: EnvRef<'_>) {
        let members = env.members();
        let accessors = members
            .iter()
            .filter(|member| !is_method(member))
            .map(|field| format!("{}()", field))
            .filter(|accessor| !members.contains(accessor))
            .collect();
        self.accessors.insert(env.id(), accessors);
    }

    fn lower(&mut self, env: EnvRef<'_>, out: &mut Vec<Artifact>) -> Result<(), Fault> {
        let accessors = self.accessors.get(&env.id()).ok_or_else(|| {
            Fault::abort(format!("{} was desugared before flow analysis", env.name()))
        })?;

        let mut members: Vec<String> = env.members().to_vec();
        members.extend(accessors.iter().cloned());

        if let Some(supertype) = env.supertype().filter(|s| s.id() != env.id()) {
            let inherited = self.accessors.get(&supertype.id()).ok_or_else(|| {
                Fault::abort(format!(
                    "supertype {} of {} has not been flowed",
                    supertype.name(),
                    env.name()
                ))
            })?;
            let bridges: Vec<String> = supertype
                .members()
                .iter()
                .chain(inherited)
                .filter(|member| is_method(member) && !members.contains(member))
                .map(|member| format!("bridge {} -> {}", member, supertype.flat_name()))
                .collect();
            members.extend(bridges);
            self.supertypes.insert(env.id(), supertype.flat_name());
        } else if let Some(extends) = env.extends() {
            self.supertypes.insert(env.id(), extends.to_string());
        }

        out.push(Artifact::new(env.flat_name(), env.id(), members));
        for nested in env.nested_envs() {
            self.lower(nested, out)?;
        }
        Ok(())
    }
}

/// Apply `f` to `env` and every environment nested in it.
fn walk(env: EnvRef<'_>, f: &mut dyn FnMut(EnvRef<'_>)) {
    f(env);
    for nested in env.nested_envs() {
        walk(nested, f);
    }
}

impl Backend for OutlineBackend {
    fn attribute(&mut self, env: EnvRef<'_>, log: &mut Diagnostics) -> Result<(), Fault> {
        tracing::debug!(class = env.name(), "attribute");
        walk(env, &mut |env| self.attribute_one(env, log));
        Ok(())
    }

    fn flow(&mut self, env: EnvRef<'_>, _log: &mut Diagnostics) -> Result<(), Fault> {
        tracing::debug!(class = env.name(), "flow");
        walk(env, &mut |env| self.flow_one(env));
        Ok(())
    }

    fn desugar(&mut self, env: EnvRef<'_>, _log: &mut Diagnostics) -> Result<Vec<Artifact>, Fault> {
        let mut artifacts = Vec::new();
        self.lower(env, &mut artifacts)?;
        Ok(artifacts)
    }

    fn generate(
        &mut self,
        _env: EnvRef<'_>,
        artifact: &Artifact,
        log: &mut Diagnostics,
    ) -> Result<Option<EmittedFile>, Fault> {
        let Some(out_dir) = &self.out_dir else {
            return Ok(None);
        };
        let path = out_dir.join(format!("{}.json", artifact.class_name));
        let class = ClassFile {
            class: &artifact.class_name,
            extends: self.supertypes.get(&artifact.env).map(String::as_str),
            members: &artifact.members,
        };

        let written = serde_json::to_string_pretty(&class)
            .map_err(std::io::Error::other)
            .and_then(|json| {
                std::fs::create_dir_all(out_dir)?;
                std::fs::write(&path, json + "\n")
            });
        match written {
            Ok(()) => Ok(Some(EmittedFile {
                class_name: artifact.class_name.clone(),
                path,
            })),
            Err(e) => {
                log.report(
                    Diagnostic::error(format!(
                        "error while writing {}: {}",
                        artifact.class_name, e
                    ))
                    .at(path.display().to_string())
                    .in_phase(Phase::Generate),
                );
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        self.accessors.clear();
        self.supertypes.clear();
    }
}
