//! Phases operation - describe the phase lattice and the compile policies.

use phasor_core::{CompilePolicy, Phase};

use crate::reports::{PhasesReport, PolicyInfo};

/// Execute the phases operation.
pub fn phases() -> PhasesReport {
    PhasesReport {
        phases: Phase::ALL.to_vec(),
        policies: CompilePolicy::ALL
            .into_iter()
            .map(|policy| PolicyInfo {
                name: policy.name(),
                description: policy.description(),
                is_default: policy == CompilePolicy::default(),
            })
            .collect(),
    }
}
