//! Clinician examination models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::account::Sex;

/// Preventive examination performed by a clinician.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExaminationType {
    GeneralPractitioner,
    Gynecologist,
    Urologist,
    Dentist,
    Dermatologist,
    Ophthalmologist,
}

const EXAM_ELIGIBILITY: &[(ExaminationType, &[Sex])] = &[
    (ExaminationType::GeneralPractitioner, &[Sex::Female, Sex::Male, Sex::Other]),
    (ExaminationType::Gynecologist, &[Sex::Female]),
    (ExaminationType::Urologist, &[Sex::Male]),
    (ExaminationType::Dentist, &[Sex::Female, Sex::Male, Sex::Other]),
    (ExaminationType::Dermatologist, &[Sex::Female, Sex::Male, Sex::Other]),
    (ExaminationType::Ophthalmologist, &[Sex::Female, Sex::Male, Sex::Other]),
];

impl ExaminationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExaminationType::GeneralPractitioner => "GENERAL_PRACTITIONER",
            ExaminationType::Gynecologist => "GYNECOLOGIST",
            ExaminationType::Urologist => "UROLOGIST",
            ExaminationType::Dentist => "DENTIST",
            ExaminationType::Dermatologist => "DERMATOLOGIST",
            ExaminationType::Ophthalmologist => "OPHTHALMOLOGIST",
        }
    }

    /// Sexes for which this examination applies.
    pub fn eligible_sexes(&self) -> &'static [Sex] {
        EXAM_ELIGIBILITY
            .iter()
            .find(|(exam_type, _)| exam_type == self)
            .map(|(_, sexes)| *sexes)
            .unwrap_or(&[])
    }

    pub fn is_eligible(&self, sex: Sex) -> bool {
        self.eligible_sexes().contains(&sex)
    }
}

impl fmt::Display for ExaminationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExaminationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERAL_PRACTITIONER" => Ok(ExaminationType::GeneralPractitioner),
            "GYNECOLOGIST" => Ok(ExaminationType::Gynecologist),
            "UROLOGIST" => Ok(ExaminationType::Urologist),
            "DENTIST" => Ok(ExaminationType::Dentist),
            "DERMATOLOGIST" => Ok(ExaminationType::Dermatologist),
            "OPHTHALMOLOGIST" => Ok(ExaminationType::Ophthalmologist),
            other => Err(format!("Unknown examination type: {}", other)),
        }
    }
}

/// Lifecycle of a clinician examination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExaminationStatus {
    /// No visit on record
    New,
    /// Performed on `date`
    Confirmed,
}

impl ExaminationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExaminationStatus::New => "NEW",
            ExaminationStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl FromStr for ExaminationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(ExaminationStatus::New),
            "CONFIRMED" => Ok(ExaminationStatus::Confirmed),
            other => Err(format!("Unknown examination status: {}", other)),
        }
    }
}

/// A clinician examination entry for an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExaminationRecord {
    /// Unique record ID
    pub record_id: String,
    /// Owning account uid
    pub account_uid: String,
    /// Examination type
    pub exam_type: ExaminationType,
    /// Last known visit date
    pub date: Option<NaiveDate>,
    /// Current status
    pub status: ExaminationStatus,
    /// Creation timestamp
    pub created_at: String,
}

impl ExaminationRecord {
    /// Create a record; a known date means the last visit already happened.
    pub fn new(account_uid: String, exam_type: ExaminationType, date: Option<NaiveDate>) -> Self {
        let status = if date.is_some() {
            ExaminationStatus::Confirmed
        } else {
            ExaminationStatus::New
        };
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            account_uid,
            exam_type,
            date,
            status,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
