use derive_new::new;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::severity::{ContraindicationType, InteractionSeverity, LabSeverity};

/// A knowledge source lookup that could not be answered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct KnowledgeError(pub String);

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// A patient lab result.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, new)]
pub struct LabObservation {
    pub code: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<ReferenceRange>,
    /// HL7 interpretation code such as "H", "L", "HH", "LL", "A".
    #[serde(default)]
    pub abnormal_flag: Option<String>,
}

/// Condition on a lab result under which a drug-lab rule fires.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum LabTrigger {
    Above { value: f64 },
    Below { value: f64 },
    /// Any abnormal flag, or one of `flags` when given.
    Abnormal {
        #[serde(default)]
        flags: Vec<String>,
    },
    OutsideReferenceRange,
}

impl LabTrigger {
    pub fn matches(&self, observation: &LabObservation) -> bool {
        match self {
            LabTrigger::Above { value } => observation.value.is_some_and(|v| v > *value),
            LabTrigger::Below { value } => observation.value.is_some_and(|v| v < *value),
            LabTrigger::Abnormal { flags } => match observation.abnormal_flag.as_deref() {
                Some(flag) if !flag.trim().is_empty() && !flag.eq_ignore_ascii_case("N") => {
                    flags.is_empty()
                        || flags.iter().any(|f| f.eq_ignore_ascii_case(flag.trim()))
                }
                _ => false,
            },
            LabTrigger::OutsideReferenceRange => {
                match (observation.value, observation.reference_range.as_ref()) {
                    (Some(value), Some(range)) => {
                        range.low.is_some_and(|low| value < low)
                            || range.high.is_some_and(|high| value > high)
                    }
                    _ => false,
                }
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugDrugRule {
    pub medication_ids: [String; 2],
    pub severity: InteractionSeverity,
    pub description: Option<String>,
    pub monograph: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AllergyRule {
    pub medication_id: String,
    /// Allergen names and classes that cross-react with the medication.
    pub allergens: Vec<String>,
    pub severity: InteractionSeverity,
    pub description: Option<String>,
    pub monograph: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConditionRule {
    pub medication_id: String,
    pub condition_code: String,
    pub contraindication_type: ContraindicationType,
    pub severity: InteractionSeverity,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LabRule {
    pub medication_id: String,
    pub lab_code: String,
    pub trigger: LabTrigger,
    pub severity: LabSeverity,
    pub description: Option<String>,
}

/// Source of interaction rules consulted by the checkers.
///
/// Lookups are synchronous and may run on blocking worker threads.
pub trait InteractionKnowledge: Send + Sync {
    /// Rule for an unordered medication pair.
    fn drug_drug(&self, first: &str, second: &str) -> Result<Option<DrugDrugRule>, KnowledgeError>;

    fn drug_allergy(
        &self,
        medication_id: &str,
        allergen: &str,
    ) -> Result<Option<AllergyRule>, KnowledgeError>;

    fn drug_condition(
        &self,
        medication_id: &str,
        condition_code: &str,
    ) -> Result<Option<ConditionRule>, KnowledgeError>;

    /// All rules for `medication_id` triggered by `observation`.
    fn drug_lab(
        &self,
        medication_id: &str,
        observation: &LabObservation,
    ) -> Result<Vec<LabRule>, KnowledgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potassium(value: f64, flag: Option<&str>) -> LabObservation {
        LabObservation::new(
            "2823-3".to_string(),
            Some(value),
            Some("mmol/L".to_string()),
            Some(ReferenceRange {
                low: Some(3.5),
                high: Some(5.1),
            }),
            flag.map(str::to_string),
        )
    }

    #[test]
    fn threshold_triggers() {
        assert!(LabTrigger::Above { value: 5.5 }.matches(&potassium(6.0, None)));
        assert!(!LabTrigger::Above { value: 5.5 }.matches(&potassium(5.5, None)));
        assert!(LabTrigger::Below { value: 3.5 }.matches(&potassium(3.0, None)));
    }

    #[test]
    fn missing_value_never_crosses_threshold() {
        let mut observation = potassium(6.0, None);
        observation.value = None;
        assert!(!LabTrigger::Above { value: 5.5 }.matches(&observation));
        assert!(!LabTrigger::OutsideReferenceRange.matches(&observation));
    }

    #[test]
    fn abnormal_flag_trigger() {
        let any = LabTrigger::Abnormal { flags: vec![] };
        assert!(any.matches(&potassium(6.0, Some("H"))));
        assert!(!any.matches(&potassium(4.0, Some("N"))));
        assert!(!any.matches(&potassium(4.0, None)));

        let critical_only = LabTrigger::Abnormal {
            flags: vec!["HH".to_string(), "LL".to_string()],
        };
        assert!(critical_only.matches(&potassium(7.0, Some("hh"))));
        assert!(!critical_only.matches(&potassium(5.4, Some("H"))));
    }

    #[test]
    fn reference_range_trigger() {
        assert!(LabTrigger::OutsideReferenceRange.matches(&potassium(5.2, None)));
        assert!(LabTrigger::OutsideReferenceRange.matches(&potassium(3.4, None)));
        assert!(!LabTrigger::OutsideReferenceRange.matches(&potassium(4.2, None)));
    }

    #[test]
    fn trigger_deserializes_from_tag() {
        let trigger: LabTrigger =
            serde_json::from_value(serde_json::json!({ "when": "above", "value": 3.5 })).unwrap();
        assert_eq!(trigger, LabTrigger::Above { value: 3.5 });
        let trigger: LabTrigger =
            serde_json::from_value(serde_json::json!({ "when": "abnormal" })).unwrap();
        assert_eq!(trigger, LabTrigger::Abnormal { flags: vec![] });
    }
}
