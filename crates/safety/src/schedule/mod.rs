/// Free-text frequency classification
pub mod frequency;

/// Scheduled instant generation
pub mod engine;

pub use engine::{check_interval, generate, in_window, EndBound, MAX_INTERVAL_HOURS};
pub use frequency::{classify, FrequencyKind};
