use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::knowledge::{
    AllergyRule, ConditionRule, DrugDrugRule, InteractionKnowledge, KnowledgeError,
    LabObservation, LabRule,
};

/// Serialized form of a rule book.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    #[serde(default)]
    pub drug_drug: Vec<DrugDrugRule>,
    #[serde(default)]
    pub drug_allergy: Vec<AllergyRule>,
    #[serde(default)]
    pub drug_condition: Vec<ConditionRule>,
    #[serde(default)]
    pub drug_lab: Vec<LabRule>,
}

/// In-memory [`InteractionKnowledge`] indexed for lookup.
#[derive(Clone, Debug, Default)]
pub struct RuleBook {
    pairs: HashMap<(String, String), DrugDrugRule>,
    allergies: HashMap<String, Vec<AllergyRule>>,
    conditions: HashMap<(String, String), ConditionRule>,
    labs: HashMap<String, Vec<LabRule>>,
}

impl RuleBook {
    pub fn new(rules: RuleSet) -> Self {
        let mut book = Self::default();

        for rule in rules.drug_drug {
            let key = normalize_pair(&rule.medication_ids[0], &rule.medication_ids[1]);
            book.pairs.insert(key, rule);
        }
        for rule in rules.drug_allergy {
            book.allergies
                .entry(rule.medication_id.clone())
                .or_default()
                .push(rule);
        }
        for rule in rules.drug_condition {
            let key = (rule.medication_id.clone(), rule.condition_code.to_uppercase());
            book.conditions.insert(key, rule);
        }
        for rule in rules.drug_lab {
            book.labs
                .entry(rule.medication_id.clone())
                .or_default()
                .push(rule);
        }

        book
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
            && self.allergies.is_empty()
            && self.conditions.is_empty()
            && self.labs.is_empty()
    }
}

impl From<RuleSet> for RuleBook {
    fn from(rules: RuleSet) -> Self {
        Self::new(rules)
    }
}

fn normalize_pair(a: &str, b: &str) -> (String, String) {
    if a < b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl InteractionKnowledge for RuleBook {
    fn drug_drug(&self, first: &str, second: &str) -> Result<Option<DrugDrugRule>, KnowledgeError> {
        Ok(self.pairs.get(&normalize_pair(first, second)).cloned())
    }

    fn drug_allergy(
        &self,
        medication_id: &str,
        allergen: &str,
    ) -> Result<Option<AllergyRule>, KnowledgeError> {
        let allergen = allergen.trim();
        let rule = self.allergies.get(medication_id).and_then(|rules| {
            rules
                .iter()
                .find(|rule| rule.allergens.iter().any(|a| a.trim().eq_ignore_ascii_case(allergen)))
        });
        Ok(rule.cloned())
    }

    fn drug_condition(
        &self,
        medication_id: &str,
        condition_code: &str,
    ) -> Result<Option<ConditionRule>, KnowledgeError> {
        let key = (medication_id.to_string(), condition_code.trim().to_uppercase());
        Ok(self.conditions.get(&key).cloned())
    }

    fn drug_lab(
        &self,
        medication_id: &str,
        observation: &LabObservation,
    ) -> Result<Vec<LabRule>, KnowledgeError> {
        let rules = self
            .labs
            .get(medication_id)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|rule| rule.lab_code.eq_ignore_ascii_case(&observation.code))
                    .filter(|rule| rule.trigger.matches(observation))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::{InteractionSeverity, LabTrigger};

    fn book() -> RuleBook {
        RuleBook::from_json(
            r#"{
                "drug_drug": [
                    { "medication_ids": ["warfarin", "aspirin"], "severity": "severe",
                      "description": "Bleeding risk", "monograph": null }
                ],
                "drug_allergy": [
                    { "medication_id": "amoxicillin", "allergens": ["Penicillin", "beta-lactam"],
                      "severity": "contraindicated", "description": null, "monograph": null }
                ],
                "drug_condition": [
                    { "medication_id": "ibuprofen", "condition_code": "n18.4",
                      "contraindication_type": "relative", "severity": "moderate",
                      "description": null }
                ],
                "drug_lab": [
                    { "medication_id": "spironolactone", "lab_code": "2823-3",
                      "trigger": { "when": "above", "value": 5.5 },
                      "severity": "critical", "description": "Hyperkalemia" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn pair_lookup_is_order_independent() {
        let book = book();
        let forward = book.drug_drug("warfarin", "aspirin").unwrap().unwrap();
        let reverse = book.drug_drug("aspirin", "warfarin").unwrap().unwrap();
        assert_eq!(forward, reverse);
        assert_eq!(forward.severity, InteractionSeverity::Severe);
        assert!(book.drug_drug("warfarin", "metformin").unwrap().is_none());
    }

    #[test]
    fn allergen_matching_ignores_case_and_matches_class() {
        let book = book();
        assert!(book.drug_allergy("amoxicillin", "penicillin").unwrap().is_some());
        assert!(book.drug_allergy("amoxicillin", " Beta-Lactam ").unwrap().is_some());
        assert!(book.drug_allergy("amoxicillin", "sulfa").unwrap().is_none());
    }

    #[test]
    fn condition_codes_ignore_case() {
        let book = book();
        assert!(book.drug_condition("ibuprofen", "N18.4").unwrap().is_some());
        assert!(book.drug_condition("ibuprofen", "I10").unwrap().is_none());
    }

    #[test]
    fn lab_rules_apply_trigger() {
        let book = book();
        let high = LabObservation {
            code: "2823-3".to_string(),
            value: Some(6.1),
            ..Default::default()
        };
        let normal = LabObservation {
            value: Some(4.2),
            ..high.clone()
        };
        let rules = book.drug_lab("spironolactone", &high).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].trigger, LabTrigger::Above { value: 5.5 });
        assert!(book.drug_lab("spironolactone", &normal).unwrap().is_empty());
    }

    #[test]
    fn empty_book() {
        assert!(RuleBook::default().is_empty());
        assert!(!book().is_empty());
    }
}
