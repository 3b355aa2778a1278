//! Medication Safety Engine

/// Engine configuration
pub mod config;

/// Due, overdue and administered dose tracking
pub mod doses;

/// Engine errors
pub mod errors;

/// Drug interaction checking
pub mod interactions;

/// Medications, prescriptions, administrations and their repositories
pub mod records;

/// Frequency parsing and schedule generation
pub mod schedule;

/// Five Rights administration verification
pub mod verification;

pub use config::MonitorConfig;
pub use errors::{Checker, Error};
