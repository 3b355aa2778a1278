use serde::{Deserialize, Serialize};

use crate::errors::Checker;

use super::severity::{ContraindicationType, InteractionSeverity, LabSeverity};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugDrugFinding {
    pub medication_ids: [String; 2],
    pub severity: InteractionSeverity,
    pub description: Option<String>,
    pub monograph: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugAllergyFinding {
    pub medication_id: String,
    pub allergen: String,
    pub severity: InteractionSeverity,
    pub description: Option<String>,
    pub monograph: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugConditionFinding {
    pub medication_id: String,
    pub condition_code: String,
    pub contraindication_type: ContraindicationType,
    pub severity: InteractionSeverity,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugLabFinding {
    pub medication_id: String,
    pub lab_code: String,
    pub observed_value: Option<f64>,
    pub unit: Option<String>,
    pub severity: LabSeverity,
    pub description: Option<String>,
}

/// Any finding from one of the four checkers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionFinding {
    DrugDrug(DrugDrugFinding),
    DrugAllergy(DrugAllergyFinding),
    DrugCondition(DrugConditionFinding),
    DrugLab(DrugLabFinding),
}

impl InteractionFinding {
    pub fn checker(&self) -> Checker {
        match self {
            InteractionFinding::DrugDrug(_) => Checker::DrugDrug,
            InteractionFinding::DrugAllergy(_) => Checker::DrugAllergy,
            InteractionFinding::DrugCondition(_) => Checker::DrugCondition,
            InteractionFinding::DrugLab(_) => Checker::DrugLab,
        }
    }

    /// Worst tier of the finding's own taxonomy.
    pub fn is_critical(&self) -> bool {
        match self {
            InteractionFinding::DrugDrug(f) => f.severity == InteractionSeverity::Contraindicated,
            InteractionFinding::DrugAllergy(f) => {
                f.severity == InteractionSeverity::Contraindicated
            }
            InteractionFinding::DrugCondition(f) => {
                f.severity == InteractionSeverity::Contraindicated
            }
            InteractionFinding::DrugLab(f) => f.severity == LabSeverity::Critical,
        }
    }

    /// Drug-drug and drug-allergy findings at contraindicated or severe.
    /// Condition and lab findings never block.
    pub fn blocks_prescribing(&self) -> bool {
        match self {
            InteractionFinding::DrugDrug(f) => f.severity.is_blocking(),
            InteractionFinding::DrugAllergy(f) => f.severity.is_blocking(),
            InteractionFinding::DrugCondition(_) | InteractionFinding::DrugLab(_) => false,
        }
    }

    pub fn involves(&self, medication_id: &str) -> bool {
        match self {
            InteractionFinding::DrugDrug(f) => f.medication_ids.iter().any(|id| id == medication_id),
            InteractionFinding::DrugAllergy(f) => f.medication_id == medication_id,
            InteractionFinding::DrugCondition(f) => f.medication_id == medication_id,
            InteractionFinding::DrugLab(f) => f.medication_id == medication_id,
        }
    }

    pub fn severity_label(&self) -> &'static str {
        match self {
            InteractionFinding::DrugDrug(f) => f.severity.as_str(),
            InteractionFinding::DrugAllergy(f) => f.severity.as_str(),
            InteractionFinding::DrugCondition(f) => f.severity.as_str(),
            InteractionFinding::DrugLab(f) => f.severity.as_str(),
        }
    }
}

impl From<DrugDrugFinding> for InteractionFinding {
    fn from(finding: DrugDrugFinding) -> Self {
        Self::DrugDrug(finding)
    }
}

impl From<DrugAllergyFinding> for InteractionFinding {
    fn from(finding: DrugAllergyFinding) -> Self {
        Self::DrugAllergy(finding)
    }
}

impl From<DrugConditionFinding> for InteractionFinding {
    fn from(finding: DrugConditionFinding) -> Self {
        Self::DrugCondition(finding)
    }
}

impl From<DrugLabFinding> for InteractionFinding {
    fn from(finding: DrugLabFinding) -> Self {
        Self::DrugLab(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allergy(severity: InteractionSeverity) -> InteractionFinding {
        DrugAllergyFinding {
            medication_id: "med-amoxicillin".to_string(),
            allergen: "penicillin".to_string(),
            severity,
            description: None,
            monograph: None,
        }
        .into()
    }

    fn condition(severity: InteractionSeverity) -> InteractionFinding {
        DrugConditionFinding {
            medication_id: "med-ibuprofen".to_string(),
            condition_code: "N18.4".to_string(),
            contraindication_type: ContraindicationType::Absolute,
            severity,
            description: None,
        }
        .into()
    }

    #[test]
    fn condition_findings_never_block() {
        assert!(condition(InteractionSeverity::Contraindicated).is_critical());
        assert!(!condition(InteractionSeverity::Contraindicated).blocks_prescribing());
    }

    #[test]
    fn allergy_blocks_at_severe() {
        assert!(allergy(InteractionSeverity::Severe).blocks_prescribing());
        assert!(!allergy(InteractionSeverity::Severe).is_critical());
        assert!(!allergy(InteractionSeverity::Moderate).blocks_prescribing());
    }

    #[test]
    fn lab_critical_is_critical() {
        let finding: InteractionFinding = DrugLabFinding {
            medication_id: "med-warfarin".to_string(),
            lab_code: "INR".to_string(),
            observed_value: Some(4.8),
            unit: None,
            severity: LabSeverity::Critical,
            description: None,
        }
        .into();
        assert!(finding.is_critical());
        assert!(!finding.blocks_prescribing());
        assert_eq!(finding.checker(), Checker::DrugLab);
        assert_eq!(finding.severity_label(), "critical");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(allergy(InteractionSeverity::Severe)).unwrap();
        assert_eq!(json["type"], "drug_allergy");
        assert_eq!(json["severity"], "severe");
        assert_eq!(json["allergen"], "penicillin");
        assert_eq!(allergy(InteractionSeverity::Severe).severity_label(), "severe");
    }
}
