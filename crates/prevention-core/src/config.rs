//! Scheduling policy configuration.
//!
//! The policy is plain data so new examination types only need a new table
//! entry. Every field has a default; a JSON document only has to name what it
//! overrides:
//!
//! ```json
//! {
//!   "tolerance_days_before": 2,
//!   "tolerance_days_after": 2,
//!   "intervals": { "BREAST": { "regular_months": 1, "follow_up_days": 14 } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SelfExaminationType;

/// Shortest month length, used to compare day and month intervals.
const MIN_DAYS_PER_MONTH: u32 = 28;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid policy: {0}")]
    Invalid(String),
}

/// Next-cycle intervals for one self-examination type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IntervalPolicy {
    /// Interval after an OK result, in calendar months
    pub regular_months: u32,
    /// Shorter interval after a finding, in days
    pub follow_up_days: u32,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            regular_months: 1,
            follow_up_days: 14,
        }
    }
}

/// Confirmation window and interval policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreventionPolicy {
    /// Days before the due date a confirmation is still accepted
    pub tolerance_days_before: u32,
    /// Days after the due date a confirmation is still accepted
    pub tolerance_days_after: u32,
    /// Per-type intervals; missing types use `IntervalPolicy::default()`
    pub intervals: BTreeMap<SelfExaminationType, IntervalPolicy>,
    /// Days from onboarding until the first self-examination is due
    pub first_due_offset_days: u32,
}

impl Default for PreventionPolicy {
    fn default() -> Self {
        let intervals = SelfExaminationType::ALL
            .iter()
            .map(|exam_type| (*exam_type, IntervalPolicy::default()))
            .collect();
        Self {
            tolerance_days_before: 2,
            tolerance_days_after: 2,
            intervals,
            first_due_offset_days: 0,
        }
    }
}

impl PreventionPolicy {
    /// Parse and validate a JSON policy.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let policy: PreventionPolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a JSON policy file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Intervals for a type.
    pub fn interval_for(&self, exam_type: SelfExaminationType) -> IntervalPolicy {
        self.intervals.get(&exam_type).copied().unwrap_or_default()
    }

    /// Reject intervals that could not move a schedule forward, follow-ups
    /// that are not shorter than the regular interval, and tolerances that
    /// would let consecutive confirmation windows overlap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance_days = self
            .tolerance_days_before
            .saturating_add(self.tolerance_days_after);

        for exam_type in SelfExaminationType::ALL {
            let interval = self.interval_for(exam_type);
            if interval.regular_months == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}: regular_months must be at least 1",
                    exam_type
                )));
            }
            if interval.follow_up_days == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}: follow_up_days must be at least 1",
                    exam_type
                )));
            }
            let shortest_regular_days = interval.regular_months.saturating_mul(MIN_DAYS_PER_MONTH);
            if interval.follow_up_days >= shortest_regular_days {
                return Err(ConfigError::Invalid(format!(
                    "{}: follow_up_days ({}) must be shorter than the regular interval ({} months)",
                    exam_type, interval.follow_up_days, interval.regular_months
                )));
            }
            // The next window opens at due + follow_up - before, which must lie
            // past the current window's end at due + after.
            if tolerance_days >= interval.follow_up_days {
                return Err(ConfigError::Invalid(format!(
                    "{}: tolerance window ({} days before + {} after) must be shorter than follow_up_days ({})",
                    exam_type,
                    self.tolerance_days_before,
                    self.tolerance_days_after,
                    interval.follow_up_days
                )));
            }
        }
        Ok(())
    }
}
