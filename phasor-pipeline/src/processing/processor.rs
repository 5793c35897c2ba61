//! The annotation processor interface.

use crate::{Diagnostics, ProcessorError, SourceUnit, TypeEnv};

/// One round of annotation processing as seen by a processor.
#[derive(Debug)]
pub struct Round<'a> {
    /// Round number, starting at 1.
    pub number: usize,
    /// Root types of this round: the types of units no earlier round has
    /// seen, plus explicitly named types in the first round.
    pub elements: Vec<&'a TypeEnv>,
    /// Set for the final round, which has no elements.
    pub last: bool,
}

impl<'a> Round<'a> {
    /// Root types carrying `annotation`.
    pub fn annotated_with<'r>(
        &'r self,
        annotation: &'r str,
    ) -> impl Iterator<Item = &'a TypeEnv> + 'r {
        self.elements
            .iter()
            .copied()
            .filter(move |env| env.has_annotation(annotation))
    }
}

/// Generates new source units from annotated types.
///
/// # Example
///
/// ```ignore
/// struct Marker;
///
/// impl Processor for Marker {
///     fn name(&self) -> &str { "marker" }
///
///     fn process(&mut self, round: &Round<'_>, log: &mut Diagnostics)
///         -> Result<Vec<SourceUnit>, ProcessorError>
///     {
///         for env in round.annotated_with("marker") {
///             log.warning(format!("{} is marked", env.name()));
///         }
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Processor: Send {
    /// The name of this processor (for diagnostics).
    fn name(&self) -> &str;

    /// Process one round. Returned units become roots of the compilation.
    fn process(
        &mut self,
        round: &Round<'_>,
        log: &mut Diagnostics,
    ) -> Result<Vec<SourceUnit>, ProcessorError>;
}
