//! Examination scheduling services.
//!
//! Pipeline: Account lookup → Eligibility → Current record → Timing window
//! → Schedule advance (compare-and-swap on the current record)

mod confirmation;
mod onboard;
mod prevention;

pub use confirmation::*;
pub use onboard::*;
pub use prevention::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::DbError;
use crate::models::{SelfExaminationType, Sex};

/// Broad error classes, for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DomainValidation,
    InternalState,
    Conflict,
    Storage,
}

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Examination {exam_type} is not applicable to sex {sex}")]
    SexNotEligible { exam_type: String, sex: Sex },

    #[error("Too early to confirm {exam_type}: due {due_date}, accepted from {window_start}, today is {today}")]
    TooEarly {
        exam_type: SelfExaminationType,
        due_date: NaiveDate,
        window_start: NaiveDate,
        today: NaiveDate,
    },

    #[error("Too late to confirm {exam_type}: due {due_date}, accepted until {window_end}, today is {today}")]
    TooLate {
        exam_type: SelfExaminationType,
        due_date: NaiveDate,
        window_end: NaiveDate,
        today: NaiveDate,
    },

    #[error("No self-examination scheduled for {exam_type} on account {account_uid}")]
    MissingSchedule {
        account_uid: String,
        exam_type: SelfExaminationType,
    },

    #[error("Cannot schedule {exam_type} after {due_date}: date out of range")]
    ScheduleOverflow {
        exam_type: SelfExaminationType,
        due_date: NaiveDate,
    },

    #[error("Schedule for {exam_type} on account {account_uid} changed concurrently")]
    ScheduleConflict {
        account_uid: String,
        exam_type: SelfExaminationType,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::AccountNotFound(_) => ErrorKind::NotFound,
            ServiceError::SexNotEligible { .. }
            | ServiceError::TooEarly { .. }
            | ServiceError::TooLate { .. }
            | ServiceError::InvalidInput(_) => ErrorKind::DomainValidation,
            ServiceError::MissingSchedule { .. } | ServiceError::ScheduleOverflow { .. } => {
                ErrorKind::InternalState
            }
            ServiceError::ScheduleConflict { .. } => ErrorKind::Conflict,
            ServiceError::Database(_) => ErrorKind::Storage,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
