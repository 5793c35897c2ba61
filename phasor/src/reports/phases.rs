//! Phases command report data structures.

use phasor_core::Phase;

use super::output::{Output, Report};

/// Report describing the phase lattice and the compile policies.
#[derive(Debug)]
pub struct PhasesReport {
    /// Phases in lattice order.
    pub phases: Vec<Phase>,
    /// Compile policies.
    pub policies: Vec<PolicyInfo>,
}

/// One compile policy.
#[derive(Debug)]
pub struct PolicyInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub is_default: bool,
}

impl Report for PhasesReport {
    fn render(&self, out: &mut dyn Output) {
        out.section("Phases");
        for phase in &self.phases {
            out.numbered_item(
                phase.ordinal() as usize,
                &format!("{:<11} {}", phase.name(), phase.description()),
            );
        }
        out.newline();

        out.section("Policies");
        for policy in &self.policies {
            let marker = if policy.is_default { " (default)" } else { "" };
            out.list_item(&format!(
                "{:<7} {}{}",
                policy.name, policy.description, marker
            ));
        }
    }
}
