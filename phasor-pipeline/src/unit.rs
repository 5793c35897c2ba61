//! Parsed source units and the type declarations they contain.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;

/// Identifies a source unit within one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(pub(crate) u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// A type declaration as produced by the parser.
///
/// Only the parts the scheduler and the collaborators need are modelled:
/// the declared supertype drives dependency ordering, annotations drive
/// annotation processing, and nested declarations get environments of
/// their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDecl {
    /// Simple name of the type.
    pub name: String,
    /// Name of the declared supertype, if any.
    pub extends: Option<String>,
    /// Annotation names on the declaration.
    pub annotations: Vec<String>,
    /// Member names, in declaration order.
    pub members: Vec<String>,
    /// Whether the type is marked deprecated.
    pub deprecated: bool,
    /// Types declared inside this one.
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    /// Create a declaration with no supertype, members or annotations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the declared supertype.
    pub fn extending(mut self, supertype: impl Into<String>) -> Self {
        self.extends = Some(supertype.into());
        self
    }

    /// Add an annotation.
    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Add a member.
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }

    /// Add a nested declaration.
    pub fn with_nested(mut self, nested: TypeDecl) -> Self {
        self.nested.push(nested);
        self
    }

    /// Mark the declaration deprecated.
    pub fn mark_deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// One parsed input file.
///
/// Immutable once parsed. A unit that failed to parse is kept as an empty
/// unit so its origin still shows up in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    origin: PathBuf,
    decls: Vec<TypeDecl>,
}

impl SourceUnit {
    pub fn new(origin: impl Into<PathBuf>, decls: Vec<TypeDecl>) -> Self {
        Self {
            origin: origin.into(),
            decls,
        }
    }

    /// A unit with no declarations.
    pub fn empty(origin: impl Into<PathBuf>) -> Self {
        Self::new(origin, Vec::new())
    }

    /// Where the unit was read from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Top-level declarations.
    pub fn decls(&self) -> &[TypeDecl] {
        &self.decls
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Qualified names of every type declared in the unit, nested ones
    /// included (`Outer.Inner`).
    pub fn declared_names(&self) -> Vec<String> {
        fn collect(prefix: Option<&str>, decl: &TypeDecl, out: &mut Vec<String>) {
            let name = match prefix {
                Some(prefix) => format!("{}.{}", prefix, decl.name),
                None => decl.name.clone(),
            };
            for nested in &decl.nested {
                collect(Some(&name), nested, out);
            }
            out.push(name);
        }

        let mut names = Vec::new();
        for decl in &self.decls {
            collect(None, decl, &mut names);
        }
        names
    }
}
