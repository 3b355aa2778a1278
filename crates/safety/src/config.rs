use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

const DEFAULT_DUE_WINDOW_MINUTES: i64 = 60;
const DEFAULT_OVERDUE_THRESHOLD_MINUTES: i64 = 30;

/// Defaults for the due and overdue dose lists.
///
/// Callers may override either value per request; these only apply when a
/// request leaves them out.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct MonitorConfig {
    /// Length of the forward-looking due window.
    pub due_window_minutes: i64,
    /// How late a pending dose must be before it is listed as overdue.
    pub overdue_threshold_minutes: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            due_window_minutes: DEFAULT_DUE_WINDOW_MINUTES,
            overdue_threshold_minutes: DEFAULT_OVERDUE_THRESHOLD_MINUTES,
        }
    }
}

impl MonitorConfig {
    /// Reads `DUE_WINDOW_MINUTES` and `OVERDUE_THRESHOLD_MINUTES`.
    pub fn from_env() -> Self {
        Self {
            due_window_minutes: env_minutes("DUE_WINDOW_MINUTES", DEFAULT_DUE_WINDOW_MINUTES),
            overdue_threshold_minutes: env_minutes(
                "OVERDUE_THRESHOLD_MINUTES",
                DEFAULT_OVERDUE_THRESHOLD_MINUTES,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.due_window_minutes <= 0 {
            return Err(Error::invalid_input(format!(
                "due window must be positive, got {} minutes",
                self.due_window_minutes
            )));
        }
        if self.overdue_threshold_minutes < 0 {
            return Err(Error::invalid_input(format!(
                "overdue threshold must not be negative, got {} minutes",
                self.overdue_threshold_minutes
            )));
        }
        Ok(())
    }
}

fn env_minutes(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
