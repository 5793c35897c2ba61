use std::{collections::HashSet, path::PathBuf};

use phasor_pipeline::{Diagnostics, Processor, ProcessorError, Round, SourceUnit, TypeDecl};

use crate::source::is_method;

/// Generates a `<Name>Builder` type for every type annotated `builder`.
///
/// The builder gets one `with_<field>()` method per field of the annotated
/// type and a `build()` method.
#[derive(Debug)]
pub struct BuilderProcessor {
    generated_dir: PathBuf,
    generated: HashSet<String>,
}

impl BuilderProcessor {
    pub const ANNOTATION: &'static str = "builder";

    /// Generated units are given origins below `generated_dir`. Nothing is
    /// written there.
    pub fn new(generated_dir: impl Into<PathBuf>) -> Self {
        Self {
            generated_dir: generated_dir.into(),
            generated: HashSet::new(),
        }
    }
}

impl Default for BuilderProcessor {
    fn default() -> Self {
        Self::new("generated")
    }
}

impl Processor for BuilderProcessor {
    fn name(&self) -> &str {
        "builder"
    }

    fn process(
        &mut self,
        round: &Round<'_>,
        _log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, ProcessorError> {
        let mut units = Vec::new();
        for env in round.annotated_with(Self::ANNOTATION) {
            let builder = format!("{}Builder", env.name());
            if env.members().iter().any(|member| member.is_empty()) {
                return Err(ProcessorError::new(format!(
                    "{} has an unnamed member",
                    env.name()
                )));
            }
            if !self.generated.insert(builder.clone()) {
                continue;
            }

            tracing::debug!(class = env.name(), builder = %builder, round = round.number, "generating builder");
            let mut decl = TypeDecl::new(&builder);
            for field in env.members().iter().filter(|member| !is_method(member)) {
                decl = decl.with_member(format!("with_{}()", field));
            }
            decl = decl.with_member("build()");

            let origin = self.generated_dir.join(format!("{}.toml", builder));
            units.push(SourceUnit::new(origin, vec![decl]));
        }
        Ok(units)
    }
}
