use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The interaction checker that produced a failure.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Checker {
    DrugDrug,
    DrugAllergy,
    DrugCondition,
    DrugLab,
}

impl fmt::Display for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Checker::DrugDrug => "drug-drug",
            Checker::DrugAllergy => "drug-allergy",
            Checker::DrugCondition => "drug-condition",
            Checker::DrugLab => "drug-lab",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Interaction checker {checker} failed: {message}")]
    CheckerFailure {
        checker: Checker,
        medication_id: Option<String>,
        message: String,
    },

    #[error("Repository error: {message}")]
    Repository { message: String },
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }
}
