//! Scheduling policies selected once per pipeline.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How the work queue is drained after entry.
///
/// The policy decides how many environments move through
/// attribute → flow → desugar → generate together before the pipeline
/// looks at the error count again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompilePolicy {
    /// Attribute everything, then stop.
    #[serde(rename = "attr")]
    AttrOnly,
    /// Attribute and flow-check everything, then stop.
    #[serde(rename = "check")]
    CheckOnly,
    /// Run each phase over the whole queue before starting the next one.
    #[serde(rename = "simple")]
    Simple,
    /// Run the full chain once per source unit.
    #[serde(rename = "byfile")]
    ByFile,
    /// Run the full chain once per queued environment.
    #[default]
    #[serde(rename = "bytodo")]
    ByTodo,
}

impl CompilePolicy {
    /// All policies, in increasing order of granularity.
    pub const ALL: [CompilePolicy; 5] = [
        CompilePolicy::AttrOnly,
        CompilePolicy::CheckOnly,
        CompilePolicy::Simple,
        CompilePolicy::ByFile,
        CompilePolicy::ByTodo,
    ];

    /// The name used in configuration files and flags.
    pub fn name(self) -> &'static str {
        match self {
            CompilePolicy::AttrOnly => "attr",
            CompilePolicy::CheckOnly => "check",
            CompilePolicy::Simple => "simple",
            CompilePolicy::ByFile => "byfile",
            CompilePolicy::ByTodo => "bytodo",
        }
    }

    /// A human-readable description of the policy.
    pub fn description(self) -> &'static str {
        match self {
            CompilePolicy::AttrOnly => "Attribute every queued type, generate nothing",
            CompilePolicy::CheckOnly => "Attribute and flow-check every queued type, generate nothing",
            CompilePolicy::Simple => "Run each phase over the whole queue; any error blocks all output",
            CompilePolicy::ByFile => "Run the full chain per source file",
            CompilePolicy::ByTodo => "Run the full chain per queued type",
        }
    }

    /// Returns true if this policy goes past flow analysis.
    pub fn generates(self) -> bool {
        !matches!(self, CompilePolicy::AttrOnly | CompilePolicy::CheckOnly)
    }
}

impl fmt::Display for CompilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompilePolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown compile policy '{}', expected one of: {}",
                    s,
                    CompilePolicy::ALL.map(CompilePolicy::name).join(", ")
                )
            })
    }
}

/// What happens to types read implicitly, i.e. from units that were not
/// given as compilation roots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplicitSourcePolicy {
    /// Check implicit types but never desugar or generate them.
    None,
    /// Generate classes for implicit types.
    Class,
    /// No policy chosen. Behaves like `Class`, and warns once when
    /// annotation processing ran while implicit sources were read.
    #[default]
    Unset,
}

impl ImplicitSourcePolicy {
    /// Returns true if implicit types may proceed past flow analysis.
    pub fn generates_implicit(self) -> bool {
        !matches!(self, ImplicitSourcePolicy::None)
    }
}

impl FromStr for ImplicitSourcePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ImplicitSourcePolicy::None),
            "class" => Ok(ImplicitSourcePolicy::Class),
            "unset" => Ok(ImplicitSourcePolicy::Unset),
            other => Err(format!(
                "unknown implicit policy '{}', expected one of: none, class",
                other
            )),
        }
    }
}

/// Whether annotation processing runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcMode {
    /// Process when at least one processor is available, then compile.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Never process.
    #[serde(rename = "none")]
    Disabled,
    /// Process, then stop before attribution.
    #[serde(rename = "only")]
    Only,
}

impl FromStr for ProcMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ProcMode::Default),
            "none" => Ok(ProcMode::Disabled),
            "only" => Ok(ProcMode::Only),
            other => Err(format!(
                "unknown processing mode '{}', expected one of: default, none, only",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_by_todo() {
        assert_eq!(CompilePolicy::default(), CompilePolicy::ByTodo);
        assert_eq!(ImplicitSourcePolicy::default(), ImplicitSourcePolicy::Unset);
    }

    #[test]
    fn test_policy_names_roundtrip() {
        for policy in CompilePolicy::ALL {
            assert_eq!(policy.name().parse::<CompilePolicy>().unwrap(), policy);
        }
        assert!("by-todo".parse::<CompilePolicy>().is_err());
    }

    #[test]
    fn test_generates() {
        assert!(!CompilePolicy::AttrOnly.generates());
        assert!(!CompilePolicy::CheckOnly.generates());
        assert!(CompilePolicy::Simple.generates());
        assert!(CompilePolicy::ByFile.generates());
        assert!(CompilePolicy::ByTodo.generates());
    }

    #[test]
    fn test_implicit_policy() {
        assert!(!ImplicitSourcePolicy::None.generates_implicit());
        assert!(ImplicitSourcePolicy::Class.generates_implicit());
        assert!(ImplicitSourcePolicy::Unset.generates_implicit());
        assert_eq!(
            "none".parse::<ImplicitSourcePolicy>().unwrap(),
            ImplicitSourcePolicy::None
        );
    }

    #[test]
    fn test_proc_mode_from_str() {
        assert_eq!("none".parse::<ProcMode>().unwrap(), ProcMode::Disabled);
        assert_eq!("only".parse::<ProcMode>().unwrap(), ProcMode::Only);
        assert!("always".parse::<ProcMode>().is_err());
    }
}
