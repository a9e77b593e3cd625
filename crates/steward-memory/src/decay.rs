//! Age-based relevance decay.
//!
//! Relevance falls off linearly with record age across a configured
//! window and is clamped to a floor, so an old record with strong
//! similarity is still retrievable rather than cut off at zero.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};

/// Linear decay across a window of days, bounded below by a floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    window_days: f32,
    floor: f32,
}

impl DecayPolicy {
    /// Create a policy; the window must be positive and the floor within [0, 1].
    pub fn new(window_days: f32, floor: f32) -> Result<Self, MemoryError> {
        if !window_days.is_finite() || window_days <= 0.0 {
            return Err(MemoryError::InvalidOptions(
                "decay window must be a positive number of days".to_string(),
            ));
        }
        if !floor.is_finite() || !(0.0..=1.0).contains(&floor) {
            return Err(MemoryError::InvalidOptions(
                "decay floor must lie within [0, 1]".to_string(),
            ));
        }
        Ok(Self { window_days, floor })
    }

    /// Multiplicative discount for a record of the given age.
    pub fn factor(&self, age_days: f32) -> f32 {
        let age = age_days.max(0.0);
        (1.0 - age / self.window_days).max(self.floor)
    }

    /// Final relevance of a similarity score at the given age.
    pub fn score(&self, raw_score: f32, age_days: f32) -> f32 {
        raw_score * self.factor(age_days)
    }

    /// Fractional age in days; clock skew clamps to zero rather than
    /// letting a future timestamp inflate the score.
    pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
        let seconds = (now - created_at).num_seconds();
        if seconds <= 0 {
            0.0
        } else {
            seconds as f32 / 86_400.0
        }
    }

    /// Configured floor.
    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Configured window in days.
    pub fn window_days(&self) -> f32 {
        self.window_days
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            window_days: 90.0,
            floor: 0.1,
        }
    }
}
