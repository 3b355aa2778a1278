use std::sync::Arc;

use derive_new::new;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::errors::{Checker, Error};

use super::checkers::{check_drug_allergy, check_drug_condition, check_drug_drug, check_drug_lab};
use super::finding::InteractionFinding;
use super::gate::{evaluate_prescribing, GateDecision};
use super::knowledge::{InteractionKnowledge, LabObservation};
use super::severity::{InteractionSeverity, LabSeverity};

/// Inputs for one batch check. Patient data must already be resolved.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, new)]
pub struct InteractionCheckRequest {
    #[serde(default)]
    pub medication_ids: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub lab_results: Vec<LabObservation>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SeverityCounts {
    pub contraindicated: usize,
    pub severe: usize,
    pub moderate: usize,
    pub mild: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: InteractionSeverity) {
        match severity {
            InteractionSeverity::Contraindicated => self.contraindicated += 1,
            InteractionSeverity::Severe => self.severe += 1,
            InteractionSeverity::Moderate => self.moderate += 1,
            InteractionSeverity::Mild => self.mild += 1,
            InteractionSeverity::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct LabSeverityCounts {
    pub critical: usize,
    pub significant: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl LabSeverityCounts {
    fn add(&mut self, severity: LabSeverity) {
        match severity {
            LabSeverity::Critical => self.critical += 1,
            LabSeverity::Significant => self.significant += 1,
            LabSeverity::Moderate => self.moderate += 1,
            LabSeverity::Minor => self.minor += 1,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchInteractionResult {
    /// Drug-drug, drug-allergy, drug-condition then drug-lab findings,
    /// each group ranked most severe first.
    pub findings: Vec<InteractionFinding>,
    pub severity_counts: SeverityCounts,
    pub lab_severity_counts: LabSeverityCounts,
    pub total_interaction_count: usize,
    pub critical_interaction_count: usize,
    pub checked_medication_count: usize,
}

impl BatchInteractionResult {
    /// Computes the aggregates over `findings`.
    pub fn from_findings(findings: Vec<InteractionFinding>, checked_medication_count: usize) -> Self {
        let mut severity_counts = SeverityCounts::default();
        let mut lab_severity_counts = LabSeverityCounts::default();

        for finding in &findings {
            match finding {
                InteractionFinding::DrugDrug(f) => severity_counts.add(f.severity),
                InteractionFinding::DrugAllergy(f) => severity_counts.add(f.severity),
                InteractionFinding::DrugCondition(f) => severity_counts.add(f.severity),
                InteractionFinding::DrugLab(f) => lab_severity_counts.add(f.severity),
            }
        }

        Self {
            total_interaction_count: findings.len(),
            critical_interaction_count: findings.iter().filter(|f| f.is_critical()).count(),
            findings,
            severity_counts,
            lab_severity_counts,
            checked_medication_count,
        }
    }

    pub fn has_interactions(&self) -> bool {
        self.total_interaction_count > 0
    }
}

/// Runs the four interaction checkers against a shared knowledge source.
#[derive(Clone)]
pub struct InteractionEngine {
    knowledge: Arc<dyn InteractionKnowledge>,
}

impl InteractionEngine {
    pub fn new(knowledge: Arc<dyn InteractionKnowledge>) -> Self {
        Self { knowledge }
    }

    /// Runs all four checkers concurrently and aggregates their findings.
    ///
    /// If any checker fails the whole call fails; no partial result is
    /// returned.
    pub async fn batch_check(
        &self,
        request: InteractionCheckRequest,
    ) -> Result<BatchInteractionResult, Error> {
        let InteractionCheckRequest {
            medication_ids,
            allergies,
            conditions,
            lab_results,
        } = request;
        let medication_ids = Arc::new(medication_ids);

        let drug_drug = {
            let (knowledge, ids) = (self.knowledge.clone(), medication_ids.clone());
            tokio::task::spawn_blocking(move || check_drug_drug(knowledge.as_ref(), &ids))
        };
        let drug_allergy = {
            let (knowledge, ids) = (self.knowledge.clone(), medication_ids.clone());
            tokio::task::spawn_blocking(move || {
                check_drug_allergy(knowledge.as_ref(), &ids, &allergies)
            })
        };
        let drug_condition = {
            let (knowledge, ids) = (self.knowledge.clone(), medication_ids.clone());
            tokio::task::spawn_blocking(move || {
                check_drug_condition(knowledge.as_ref(), &ids, &conditions)
            })
        };
        let drug_lab = {
            let (knowledge, ids) = (self.knowledge.clone(), medication_ids.clone());
            tokio::task::spawn_blocking(move || check_drug_lab(knowledge.as_ref(), &ids, &lab_results))
        };

        let (drug_drug, drug_allergy, drug_condition, drug_lab) = tokio::try_join!(
            joined(Checker::DrugDrug, drug_drug),
            joined(Checker::DrugAllergy, drug_allergy),
            joined(Checker::DrugCondition, drug_condition),
            joined(Checker::DrugLab, drug_lab)
        )
        .inspect_err(|e| tracing::error!("Interaction batch failed: {}", e))?;

        let findings: Vec<InteractionFinding> = drug_drug
            .into_iter()
            .map(InteractionFinding::from)
            .chain(drug_allergy.into_iter().map(InteractionFinding::from))
            .chain(drug_condition.into_iter().map(InteractionFinding::from))
            .chain(drug_lab.into_iter().map(InteractionFinding::from))
            .collect();

        let result = BatchInteractionResult::from_findings(findings, distinct_count(&medication_ids));
        tracing::info!(
            "Checked {} medications: {} interactions, {} critical",
            result.checked_medication_count,
            result.total_interaction_count,
            result.critical_interaction_count
        );
        Ok(result)
    }

    /// Checks a proposed medication against the patient's current ones.
    ///
    /// Only findings involving the proposed medication are reported and
    /// gated; interactions among current medications predate this order.
    pub async fn check_new_prescription(
        &self,
        medication_id: &str,
        request: InteractionCheckRequest,
        override_requested: bool,
    ) -> Result<(BatchInteractionResult, GateDecision), Error> {
        let mut medication_ids = vec![medication_id.to_string()];
        medication_ids.extend(
            request
                .medication_ids
                .iter()
                .filter(|id| id.as_str() != medication_id)
                .cloned(),
        );
        let request = InteractionCheckRequest {
            medication_ids,
            ..request
        };

        let full = self.batch_check(request).await?;
        let findings = full
            .findings
            .into_iter()
            .filter(|finding| finding.involves(medication_id))
            .collect();
        let result = BatchInteractionResult::from_findings(findings, full.checked_medication_count);

        let decision = evaluate_prescribing(&result, override_requested);
        for finding in &decision.blocking_findings {
            tracing::warn!(
                "Prescription of {} {}: {} {} finding",
                medication_id,
                if decision.overridden { "overridden" } else { "blocked" },
                finding.severity_label(),
                finding.checker()
            );
        }
        Ok((result, decision))
    }
}

async fn joined<T>(checker: Checker, handle: JoinHandle<Result<T, Error>>) -> Result<T, Error> {
    handle.await.map_err(|e| Error::CheckerFailure {
        checker,
        medication_id: None,
        message: e.to_string(),
    })?
}

fn distinct_count(ids: &[String]) -> usize {
    let mut ids: Vec<&String> = ids.iter().collect();
    ids.sort();
    ids.dedup();
    ids.len()
}
