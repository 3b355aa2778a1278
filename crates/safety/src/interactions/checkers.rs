use std::collections::HashSet;

use crate::errors::{Checker, Error};

use super::finding::{DrugAllergyFinding, DrugConditionFinding, DrugDrugFinding, DrugLabFinding};
use super::knowledge::{InteractionKnowledge, KnowledgeError, LabObservation};

/// Evaluates every unordered pair of distinct medications.
pub fn check_drug_drug(
    knowledge: &dyn InteractionKnowledge,
    medication_ids: &[String],
) -> Result<Vec<DrugDrugFinding>, Error> {
    let ids = unique(medication_ids);
    let mut findings = Vec::new();

    for (i, first) in ids.iter().enumerate() {
        for second in &ids[i + 1..] {
            let rule = knowledge
                .drug_drug(first, second)
                .map_err(|e| failure(Checker::DrugDrug, first, e))?;

            if let Some(rule) = rule {
                tracing::debug!("{} interaction between {} and {}", rule.severity, first, second);
                findings.push(DrugDrugFinding {
                    medication_ids: [first.to_string(), second.to_string()],
                    severity: rule.severity,
                    description: rule.description,
                    monograph: rule.monograph,
                });
            }
        }
    }

    findings.sort_by_key(|f| f.severity.rank());
    Ok(findings)
}

pub fn check_drug_allergy(
    knowledge: &dyn InteractionKnowledge,
    medication_ids: &[String],
    allergens: &[String],
) -> Result<Vec<DrugAllergyFinding>, Error> {
    let mut findings = Vec::new();

    for medication_id in unique(medication_ids) {
        for allergen in allergens.iter().filter(|a| !a.trim().is_empty()) {
            let rule = knowledge
                .drug_allergy(medication_id, allergen)
                .map_err(|e| failure(Checker::DrugAllergy, medication_id, e))?;

            if let Some(rule) = rule {
                findings.push(DrugAllergyFinding {
                    medication_id: medication_id.to_string(),
                    allergen: allergen.clone(),
                    severity: rule.severity,
                    description: rule.description,
                    monograph: rule.monograph,
                });
            }
        }
    }

    findings.sort_by_key(|f| f.severity.rank());
    Ok(findings)
}

pub fn check_drug_condition(
    knowledge: &dyn InteractionKnowledge,
    medication_ids: &[String],
    condition_codes: &[String],
) -> Result<Vec<DrugConditionFinding>, Error> {
    let mut findings = Vec::new();

    for medication_id in unique(medication_ids) {
        for code in condition_codes.iter().filter(|c| !c.trim().is_empty()) {
            let rule = knowledge
                .drug_condition(medication_id, code)
                .map_err(|e| failure(Checker::DrugCondition, medication_id, e))?;

            if let Some(rule) = rule {
                findings.push(DrugConditionFinding {
                    medication_id: medication_id.to_string(),
                    condition_code: code.clone(),
                    contraindication_type: rule.contraindication_type,
                    severity: rule.severity,
                    description: rule.description,
                });
            }
        }
    }

    findings.sort_by_key(|f| f.severity.rank());
    Ok(findings)
}

pub fn check_drug_lab(
    knowledge: &dyn InteractionKnowledge,
    medication_ids: &[String],
    lab_results: &[LabObservation],
) -> Result<Vec<DrugLabFinding>, Error> {
    let mut findings = Vec::new();

    for medication_id in unique(medication_ids) {
        for observation in lab_results {
            let rules = knowledge
                .drug_lab(medication_id, observation)
                .map_err(|e| failure(Checker::DrugLab, medication_id, e))?;

            findings.extend(rules.into_iter().map(|rule| DrugLabFinding {
                medication_id: medication_id.to_string(),
                lab_code: observation.code.clone(),
                observed_value: observation.value,
                unit: observation.unit.clone(),
                severity: rule.severity,
                description: rule.description,
            }));
        }
    }

    findings.sort_by_key(|f| f.severity.rank());
    Ok(findings)
}

/// Distinct ids in first-seen order.
fn unique(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn failure(checker: Checker, medication_id: &str, error: KnowledgeError) -> Error {
    Error::CheckerFailure {
        checker,
        medication_id: Some(medication_id.to_string()),
        message: error.to_string(),
    }
}
