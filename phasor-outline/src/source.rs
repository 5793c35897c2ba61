//! The TOML outline format.
//!
//! An outline file declares one or more types:
//!
//! ```toml
//! [[type]]
//! name = "Point"
//! extends = "Shape"
//! annotations = ["builder"]
//! members = ["x", "y", "area()"]
//!
//! [[type.nested]]
//! name = "Origin"
//! ```
//!
//! Members ending in `()` are methods, everything else is a field.

use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use phasor_pipeline::{ParseError, SourceUnit, TypeDecl};
use serde::Deserialize;

use crate::error::{OutlineError, Result, SourceContext};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OutlineDoc {
    #[serde(rename = "type")]
    types: Vec<OutlineType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutlineType {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    annotations: Vec<String>,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    nested: Vec<OutlineType>,
}

impl OutlineType {
    fn validate(&self, ctx: &SourceContext) -> Result<()> {
        if self.name.is_empty() {
            return Err(ctx.invalid_name(&self.name, "name is empty"));
        }
        if let Some(bad) = self
            .name
            .chars()
            .find(|c| matches!(c, '.' | '$') || c.is_whitespace())
        {
            return Err(ctx.invalid_name(&self.name, &format!("contains '{}'", bad)));
        }
        self.nested.iter().try_for_each(|nested| nested.validate(ctx))
    }

    fn into_decl(self) -> TypeDecl {
        TypeDecl {
            name: self.name,
            extends: self.extends,
            annotations: self.annotations,
            members: self.members,
            deprecated: self.deprecated,
            nested: self.nested.into_iter().map(OutlineType::into_decl).collect(),
        }
    }
}

/// Returns true if `member` names a method.
pub fn is_method(member: &str) -> bool {
    member.ends_with("()")
}

/// Parse outline text into type declarations.
pub fn parse_outline(content: &str, filename: &str) -> Result<Vec<TypeDecl>> {
    let ctx = SourceContext::new(content, filename);
    let doc: OutlineDoc = toml::from_str(content).map_err(|e| ctx.parse_error(e))?;
    for ty in &doc.types {
        ty.validate(&ctx)?;
    }
    Ok(doc.types.into_iter().map(OutlineType::into_decl).collect())
}

/// Read and parse an outline file.
pub fn read_outline(path: &Path) -> Result<SourceUnit> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Box::new(OutlineError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    })?;
    let decls = parse_outline(&content, &path.display().to_string())?;
    Ok(SourceUnit::new(path, decls))
}

/// 1-based line and column of a byte offset.
pub(crate) fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.len(), |newline| before.len() - newline - 1)
        + 1;
    (line, column)
}

/// Convert an outline error into the pipeline's parse error, with a
/// `path:line:column` location when the error points into the file.
pub(crate) fn to_parse_error(path: &Path, error: &OutlineError, src: Option<&str>) -> ParseError {
    let parse_error = ParseError::new(error.summary());
    match (error.offset(), src) {
        (Some(offset), Some(src)) => {
            let (line, column) = line_col(src, offset);
            parse_error.at(format!("{}:{}:{}", path.display(), line, column))
        }
        _ => parse_error.at(path.display().to_string()),
    }
}

/// Outline errors collected while a pipeline runs, kept whole so the
/// command line can render them with their source snippets.
#[derive(Debug, Clone, Default)]
pub struct ParseFailures(Arc<Mutex<Vec<OutlineError>>>);

impl ParseFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, error: OutlineError) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every failure recorded so far.
    pub fn take(&self) -> Vec<OutlineError> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outline() {
        let decls = parse_outline(
            r#"
            [[type]]
            name = "Point"
            extends = "Shape"
            annotations = ["builder"]
            members = ["x", "y", "area()"]

            [[type.nested]]
            name = "Origin"

            [[type]]
            name = "Shape"
            deprecated = true
            "#,
            "Point.toml",
        )
        .unwrap();

        assert_eq!(decls.len(), 2);
        let point = &decls[0];
        assert_eq!(point.name, "Point");
        assert_eq!(point.extends.as_deref(), Some("Shape"));
        assert_eq!(point.annotations, vec!["builder"]);
        assert_eq!(point.members, vec!["x", "y", "area()"]);
        assert_eq!(point.nested[0].name, "Origin");
        assert!(decls[1].deprecated);
    }

    #[test]
    fn test_empty_outline() {
        assert!(parse_outline("", "Empty.toml").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = parse_outline("[[type]]\nname = \"A\"\nsuper = \"B\"\n", "A.toml").unwrap_err();
        assert!(matches!(*err, OutlineError::Parse { .. }));
        assert!(err.summary().contains("unknown field `super`"));
    }

    #[test]
    fn test_qualified_name_is_rejected() {
        let err = parse_outline(
            "[[type]]\nname = \"A\"\n\n[[type.nested]]\nname = \"B.C\"\n",
            "A.toml",
        )
        .unwrap_err();
        assert_eq!(err.summary(), "invalid type name 'B.C': contains '.'");
        assert_eq!(err.offset(), Some(44));
    }

    #[test]
    fn test_line_col() {
        let src = "a\nbc\ndef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 3), (2, 2));
        assert_eq!(line_col(src, 5), (3, 1));
        assert_eq!(line_col(src, 100), (3, 4));
    }

    #[test]
    fn test_parse_error_location() {
        let src = "[[type]]\nname = \n";
        let err = parse_outline(src, "Broken.toml").unwrap_err();
        let parse_error = to_parse_error(Path::new("Broken.toml"), &err, Some(src));
        assert!(
            parse_error
                .location
                .as_deref()
                .is_some_and(|loc| loc.starts_with("Broken.toml:2:"))
        );
    }

    #[test]
    fn test_failures_are_taken_once() {
        let failures = ParseFailures::new();
        let err = parse_outline("[[type]]\nname = \"\"\n", "A.toml").unwrap_err();
        failures.push(*err);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures.take().len(), 1);
        assert!(failures.is_empty());
    }
}
