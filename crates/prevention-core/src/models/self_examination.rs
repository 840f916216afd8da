//! Self-examination models: types, results, scheduled records and outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::account::Sex;

/// Kind of self-examination the user performs on their own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelfExaminationType {
    Breast,
    Testicular,
    Skin,
}

/// Eligible sexes per self-examination type. Every entry is non-empty.
const SELF_EXAM_ELIGIBILITY: &[(SelfExaminationType, &[Sex])] = &[
    (SelfExaminationType::Breast, &[Sex::Female]),
    (SelfExaminationType::Testicular, &[Sex::Male]),
    (SelfExaminationType::Skin, &[Sex::Female, Sex::Male, Sex::Other]),
];

impl SelfExaminationType {
    pub const ALL: [SelfExaminationType; 3] = [
        SelfExaminationType::Breast,
        SelfExaminationType::Testicular,
        SelfExaminationType::Skin,
    ];

    /// Stable storage/wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelfExaminationType::Breast => "BREAST",
            SelfExaminationType::Testicular => "TESTICULAR",
            SelfExaminationType::Skin => "SKIN",
        }
    }

    /// Sexes for which this examination applies.
    pub fn eligible_sexes(&self) -> &'static [Sex] {
        SELF_EXAM_ELIGIBILITY
            .iter()
            .find(|(exam_type, _)| exam_type == self)
            .map(|(_, sexes)| *sexes)
            .unwrap_or(&[])
    }

    /// Check whether an account of the given sex may perform this examination.
    pub fn is_eligible(&self, sex: Sex) -> bool {
        self.eligible_sexes().contains(&sex)
    }

    /// All self-examination types applicable to the given sex.
    pub fn eligible_for(sex: Sex) -> Vec<SelfExaminationType> {
        Self::ALL
            .iter()
            .copied()
            .filter(|exam_type| exam_type.is_eligible(sex))
            .collect()
    }
}

impl fmt::Display for SelfExaminationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelfExaminationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BREAST" => Ok(SelfExaminationType::Breast),
            "TESTICULAR" => Ok(SelfExaminationType::Testicular),
            "SKIN" => Ok(SelfExaminationType::Skin),
            other => Err(format!("Unknown self-examination type: {}", other)),
        }
    }
}

/// Result reported by the user when confirming a self-examination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelfExaminationResult {
    /// Nothing unusual found
    Ok,
    /// Something found that needs an earlier re-check
    Finding,
}

impl SelfExaminationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelfExaminationResult::Ok => "OK",
            SelfExaminationResult::Finding => "FINDING",
        }
    }

    /// Whether the next cycle should use the shorter follow-up interval.
    pub fn needs_follow_up(&self) -> bool {
        matches!(self, SelfExaminationResult::Finding)
    }
}

impl fmt::Display for SelfExaminationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelfExaminationResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(SelfExaminationResult::Ok),
            "FINDING" => Ok(SelfExaminationResult::Finding),
            other => Err(format!("Unknown self-examination result: {}", other)),
        }
    }
}

/// One scheduled self-examination cycle. Immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelfExaminationRecord {
    /// Unique record ID
    pub record_id: String,
    /// Owning account uid
    pub account_uid: String,
    /// Examination type
    pub exam_type: SelfExaminationType,
    /// Date the examination is due
    pub due_date: NaiveDate,
    /// Creation timestamp
    pub created_at: String,
}

impl SelfExaminationRecord {
    pub fn new(account_uid: String, exam_type: SelfExaminationType, due_date: NaiveDate) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            account_uid,
            exam_type,
            due_date,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of an accepted confirmation, closing one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelfExaminationOutcome {
    /// Unique outcome ID
    pub outcome_id: String,
    /// The record this confirmation closed
    pub record_id: String,
    /// Owning account uid
    pub account_uid: String,
    /// Examination type
    pub exam_type: SelfExaminationType,
    /// Reported result
    pub result: SelfExaminationResult,
    /// Date the user confirmed
    pub confirmed_on: NaiveDate,
    /// Creation timestamp
    pub created_at: String,
}

impl SelfExaminationOutcome {
    pub fn new(
        closed: &SelfExaminationRecord,
        result: SelfExaminationResult,
        confirmed_on: NaiveDate,
    ) -> Self {
        Self {
            outcome_id: uuid::Uuid::new_v4().to_string(),
            record_id: closed.record_id.clone(),
            account_uid: closed.account_uid.clone(),
            exam_type: closed.exam_type,
            result,
            confirmed_on,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Inclusive date range in which a confirmation is accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Where a date falls relative to a confirmation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    Early,
    Inside,
    Late,
}

impl ConfirmationWindow {
    /// Window around `due_date`, saturating at the calendar bounds.
    pub fn around(due_date: NaiveDate, days_before: u32, days_after: u32) -> Self {
        let start = due_date
            .checked_sub_days(Days::new(u64::from(days_before)))
            .unwrap_or(NaiveDate::MIN);
        let end = due_date
            .checked_add_days(Days::new(u64::from(days_after)))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn position(&self, date: NaiveDate) -> WindowPosition {
        if date < self.start {
            WindowPosition::Early
        } else if date > self.end {
            WindowPosition::Late
        } else {
            WindowPosition::Inside
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.position(date) == WindowPosition::Inside
    }
}
