use serde::{Deserialize, Serialize};

use super::batch::BatchInteractionResult;
use super::finding::InteractionFinding;

/// Outcome of the prescribing gate.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GateDecision {
    pub allowed: bool,
    /// Blocking findings were present but an override was supplied.
    pub overridden: bool,
    pub blocking_findings: Vec<InteractionFinding>,
}

/// Blocks a new prescription when any drug-drug or drug-allergy finding is
/// contraindicated or severe, unless an override is supplied.
///
/// Drug-condition and drug-lab findings are informational here.
pub fn evaluate_prescribing(result: &BatchInteractionResult, override_requested: bool) -> GateDecision {
    let blocking_findings: Vec<InteractionFinding> = result
        .findings
        .iter()
        .filter(|finding| finding.blocks_prescribing())
        .cloned()
        .collect();

    let blocked = !blocking_findings.is_empty();
    GateDecision {
        allowed: !blocked || override_requested,
        overridden: blocked && override_requested,
        blocking_findings,
    }
}
