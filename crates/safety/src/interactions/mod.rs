/// Severity taxonomies
pub mod severity;

/// Typed interaction findings
pub mod finding;

/// Knowledge source contract and rule shapes
pub mod knowledge;

/// In-memory rule book
pub mod rulebook;

/// The four independent checkers
pub mod checkers;

/// Concurrent batch orchestration
pub mod batch;

/// Prescription blocking policy
pub mod gate;

pub use batch::{
    BatchInteractionResult, InteractionCheckRequest, InteractionEngine, LabSeverityCounts,
    SeverityCounts,
};
pub use checkers::{check_drug_allergy, check_drug_condition, check_drug_drug, check_drug_lab};
pub use finding::{
    DrugAllergyFinding, DrugConditionFinding, DrugDrugFinding, DrugLabFinding, InteractionFinding,
};
pub use gate::{evaluate_prescribing, GateDecision};
pub use knowledge::{
    AllergyRule, ConditionRule, DrugDrugRule, InteractionKnowledge, KnowledgeError, LabObservation,
    LabRule, LabTrigger, ReferenceRange,
};
pub use rulebook::{RuleBook, RuleSet};
pub use severity::{ContraindicationType, InteractionSeverity, LabSeverity};
