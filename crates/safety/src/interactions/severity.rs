use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity for drug-drug, drug-allergy and drug-condition findings,
/// declared most to least severe.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    Contraindicated,
    Severe,
    Moderate,
    Mild,
    Unknown,
}

impl InteractionSeverity {
    pub fn rank(&self) -> u8 {
        match self {
            InteractionSeverity::Contraindicated => 0,
            InteractionSeverity::Severe => 1,
            InteractionSeverity::Moderate => 2,
            InteractionSeverity::Mild => 3,
            InteractionSeverity::Unknown => 4,
        }
    }

    /// Contraindicated or severe.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            InteractionSeverity::Contraindicated | InteractionSeverity::Severe
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionSeverity::Contraindicated => "contraindicated",
            InteractionSeverity::Severe => "severe",
            InteractionSeverity::Moderate => "moderate",
            InteractionSeverity::Mild => "mild",
            InteractionSeverity::Unknown => "unknown",
        }
    }
}

impl Default for InteractionSeverity {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for InteractionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity for drug-lab findings, most to least severe.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LabSeverity {
    Critical,
    Significant,
    Moderate,
    Minor,
}

impl LabSeverity {
    pub fn rank(&self) -> u8 {
        match self {
            LabSeverity::Critical => 0,
            LabSeverity::Significant => 1,
            LabSeverity::Moderate => 2,
            LabSeverity::Minor => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabSeverity::Critical => "critical",
            LabSeverity::Significant => "significant",
            LabSeverity::Moderate => "moderate",
            LabSeverity::Minor => "minor",
        }
    }
}

impl fmt::Display for LabSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContraindicationType {
    Absolute,
    Relative,
    Caution,
}
