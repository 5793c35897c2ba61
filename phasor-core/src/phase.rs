//! The compilation phase lattice.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A phase of the compilation pipeline.
///
/// Phases are totally ordered by their discriminant. A type environment's
/// recorded phase only ever moves forward, so "has reached phase X" is a
/// plain `>=` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Phase {
    /// Source text has been turned into a unit.
    Parse = 1,
    /// Declared types have been registered and queued.
    Enter = 2,
    /// Annotation processing has run (or was skipped).
    Process = 3,
    /// Semantic attribution.
    Attr = 4,
    /// Dataflow checking.
    Flow = 5,
    /// Generic type erasure, the first half of desugaring.
    TransTypes = 6,
    /// Lowering to generatable classes, the second half of desugaring.
    Lower = 7,
    /// Class output.
    Generate = 8,
}

impl Phase {
    /// All phases in lattice order.
    pub const ALL: [Phase; 8] = [
        Phase::Parse,
        Phase::Enter,
        Phase::Process,
        Phase::Attr,
        Phase::Flow,
        Phase::TransTypes,
        Phase::Lower,
        Phase::Generate,
    ];

    /// The position of this phase in the lattice, starting at 1.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The lowercase name used in configuration files and flags.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::Enter => "enter",
            Phase::Process => "process",
            Phase::Attr => "attr",
            Phase::Flow => "flow",
            Phase::TransTypes => "transtypes",
            Phase::Lower => "lower",
            Phase::Generate => "generate",
        }
    }

    /// A human-readable description of the phase.
    pub fn description(self) -> &'static str {
        match self {
            Phase::Parse => "Read source units",
            Phase::Enter => "Register declared types and queue them",
            Phase::Process => "Run annotation processors",
            Phase::Attr => "Attribute types and expressions",
            Phase::Flow => "Check dataflow",
            Phase::TransTypes => "Erase generic types",
            Phase::Lower => "Lower to generatable classes",
            Phase::Generate => "Write class output",
        }
    }

    /// Returns true if this phase comes strictly after `other`.
    pub fn is_after(self, other: Phase) -> bool {
        self > other
    }

    /// The phase following this one, if any.
    pub fn next(self) -> Option<Phase> {
        Phase::ALL.get(self as usize).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Phase::ALL
            .into_iter()
            .find(|phase| phase.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown phase '{}', expected one of: {}",
                    s,
                    Phase::ALL.map(Phase::name).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        for pair in Phase::ALL.windows(2) {
            assert!(pair[1].is_after(pair[0]));
            assert!(!pair[0].is_after(pair[1]));
        }
        assert!(!Phase::Attr.is_after(Phase::Attr));
    }

    #[test]
    fn test_ordinals_are_dense() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.ordinal() as usize, i + 1);
        }
    }

    #[test]
    fn test_next() {
        assert_eq!(Phase::Parse.next(), Some(Phase::Enter));
        assert_eq!(Phase::Lower.next(), Some(Phase::Generate));
        assert_eq!(Phase::Generate.next(), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("attr".parse::<Phase>().unwrap(), Phase::Attr);
        assert_eq!("TRANSTYPES".parse::<Phase>().unwrap(), Phase::TransTypes);
        let err = "desugar".parse::<Phase>().unwrap_err();
        assert!(err.contains("unknown phase 'desugar'"));
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Holder {
            phase: Phase,
        }
        let holder: Holder = toml::from_str(r#"phase = "transtypes""#).unwrap();
        assert_eq!(holder.phase, Phase::TransTypes);
    }
}
