//! Prevention Core Library
//!
//! Preventive examination tracking: clinician exams, self-examination
//! schedules and the rules for confirming a self-examination.
//!
//! # Architecture
//!
//! ```text
//! confirm_self_exam(type, result, uid)
//!          │
//!          ▼
//!   AccountLookup ──► not found ───────────────► NotFound
//!          │
//!          ▼
//!   Eligibility table ──► sex not eligible ─────► DomainValidation
//!          │
//!          ▼
//!   Current record (max due date) ──► none ─────► InternalState
//!          │
//!          ▼
//!   Confirmation window ──► too early / late ───► DomainValidation
//!          │
//!          ▼
//!   ┌──────────────────────────────────────────┐
//!   │  PreventionService::advance_schedule     │
//!   │  next due = due + interval(type, result) │
//!   │  compare-and-swap on current record      │──► Conflict
//!   └──────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Account, SelfExaminationRecord, etc.)
//! - [`store`]: Collaborator traits consumed by the services
//! - [`service`]: Confirmation, scheduling and onboarding services
//! - [`config`]: Scheduling policy
//! - [`clock`]: Injected time source
//! - [`logging`]: Subscriber bootstrap

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, IntervalPolicy, PreventionPolicy};
pub use db::Database;
pub use models::{
    Account, ConfirmationWindow, ExaminationRecord, ExaminationStatus, ExaminationType,
    SelfExaminationOutcome, SelfExaminationRecord, SelfExaminationResult, SelfExaminationType,
    Sex,
};
pub use service::{
    ErrorKind, ExaminationRecordService, OnboardRequest, OnboardService, PreventionService,
    ScheduleAdvance, SelfExamStatus, ServiceError,
};
pub use store::{AccountLookup, SelfExaminationStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PreventionError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for PreventionError {
    fn from(e: db::DbError) -> Self {
        PreventionError::DatabaseError(e.to_string())
    }
}

impl From<ServiceError> for PreventionError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::NotFound => PreventionError::NotFound(message),
            ErrorKind::DomainValidation => PreventionError::ValidationFailed(message),
            ErrorKind::InternalState => PreventionError::InvalidState(message),
            ErrorKind::Conflict => PreventionError::Conflict(message),
            ErrorKind::Storage => PreventionError::DatabaseError(message),
        }
    }
}

impl From<ConfigError> for PreventionError {
    fn from(e: ConfigError) -> Self {
        PreventionError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PreventionError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PreventionError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// `policy_json` overrides the default scheduling policy when given.
#[uniffi::export]
pub fn open_database(
    path: String,
    policy_json: Option<String>,
) -> Result<Arc<PreventionCore>, PreventionError> {
    let db = Database::open(&path)?;
    PreventionCore::build(db, policy_json)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PreventionCore>, PreventionError> {
    let db = Database::open_in_memory()?;
    PreventionCore::build(db, None)
}

/// Install the default log subscriber.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<(), PreventionError> {
    logging::init_logging(&filter).map_err(PreventionError::ConfigError)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PreventionCore {
    db: Arc<Mutex<Database>>,
    policy: PreventionPolicy,
}

impl PreventionCore {
    fn build(db: Database, policy_json: Option<String>) -> Result<Arc<Self>, PreventionError> {
        let policy = match policy_json {
            Some(json) => PreventionPolicy::from_json_str(&json)?,
            None => PreventionPolicy::default(),
        };
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            policy,
        }))
    }
}

#[uniffi::export]
impl PreventionCore {
    // =========================================================================
    // Onboarding
    // =========================================================================

    /// Create an account with its examinations and first self-exam schedule.
    pub fn onboard(&self, request: FfiOnboardRequest) -> Result<FfiOnboardSummary, PreventionError> {
        let db = self.db.lock()?;
        let request: OnboardRequest = request.try_into()?;
        let summary = OnboardService::new(&db, &self.policy, &SystemClock).onboard(&request)?;
        Ok(summary.into())
    }

    // =========================================================================
    // Self-Examinations
    // =========================================================================

    /// Confirm a self-examination for the account `uid`.
    pub fn confirm_self_exam(
        &self,
        exam_type: String,
        result: String,
        uid: String,
    ) -> Result<FfiConfirmation, PreventionError> {
        let exam_type: SelfExaminationType =
            exam_type.parse().map_err(PreventionError::InvalidInput)?;
        let result: SelfExaminationResult = result.parse().map_err(PreventionError::InvalidInput)?;

        let db = self.db.lock()?;
        let prevention = PreventionService::new(&*db, &self.policy);
        let service = ExaminationRecordService::new(&*db, prevention, &SystemClock);
        let advance = service.confirm_self_exam(exam_type, result, &uid)?;
        Ok(advance.into())
    }

    /// Start the schedule for a self-examination type the account has no
    /// record for yet. An existing schedule is returned unchanged.
    pub fn schedule_self_exam(
        &self,
        uid: String,
        exam_type: String,
    ) -> Result<FfiSelfExamRecord, PreventionError> {
        let exam_type: SelfExaminationType =
            exam_type.parse().map_err(PreventionError::InvalidInput)?;

        let db = self.db.lock()?;
        let account = db
            .get_account(&uid)?
            .ok_or_else(|| PreventionError::NotFound(format!("Account not found: {}", uid)))?;
        let prevention = PreventionService::new(&*db, &self.policy);
        let record = prevention.schedule_first(&account, exam_type, SystemClock.today())?;
        Ok(record.into())
    }

    /// Current self-examination schedule for the account.
    pub fn prevention_status(&self, uid: String) -> Result<Vec<FfiSelfExamStatus>, PreventionError> {
        let db = self.db.lock()?;
        let account = db
            .get_account(&uid)?
            .ok_or_else(|| PreventionError::NotFound(format!("Account not found: {}", uid)))?;
        let prevention = PreventionService::new(&*db, &self.policy);
        let status = prevention.prevention_status(&account, SystemClock.today())?;
        Ok(status.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Clinician Examinations
    // =========================================================================

    /// List clinician examinations for the account.
    pub fn list_examinations(&self, uid: String) -> Result<Vec<FfiExamination>, PreventionError> {
        let db = self.db.lock()?;
        if !db.account_exists(&uid)? {
            return Err(PreventionError::NotFound(format!("Account not found: {}", uid)));
        }
        let records = db.list_examination_records(&uid)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn parse_ffi_date(value: Option<String>) -> Result<Option<NaiveDate>, PreventionError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|e| PreventionError::InvalidInput(format!("Invalid date '{}': {}", v, e)))
        })
        .transpose()
}

/// FFI-safe onboarding request. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOnboardRequest {
    pub uid: String,
    pub salutation: Option<String>,
    pub email: String,
    pub notification_email: Option<String>,
    pub sex: String,
    pub birthdate: Option<String>,
    pub examinations: Vec<FfiOnboardExamination>,
}

/// FFI-safe onboarding examination entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOnboardExamination {
    pub exam_type: String,
    pub date: Option<String>,
}

impl TryFrom<FfiOnboardRequest> for OnboardRequest {
    type Error = PreventionError;

    fn try_from(request: FfiOnboardRequest) -> Result<Self, Self::Error> {
        let examinations = request
            .examinations
            .into_iter()
            .map(|exam| {
                Ok(service::OnboardExamination {
                    exam_type: exam.exam_type.parse().map_err(PreventionError::InvalidInput)?,
                    date: parse_ffi_date(exam.date)?,
                })
            })
            .collect::<Result<Vec<_>, PreventionError>>()?;

        Ok(OnboardRequest {
            user: service::OnboardUser {
                uid: request.uid,
                salutation: request.salutation,
                email: request.email,
                notification_email: request.notification_email,
                sex: request.sex.parse().map_err(PreventionError::InvalidInput)?,
                birthdate: parse_ffi_date(request.birthdate)?,
            },
            examinations,
        })
    }
}

/// FFI-safe onboarding result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOnboardSummary {
    pub uid: String,
    pub notification_email: String,
    pub examinations: Vec<FfiExamination>,
    pub self_examinations: Vec<FfiSelfExamRecord>,
}

impl From<service::OnboardSummary> for FfiOnboardSummary {
    fn from(summary: service::OnboardSummary) -> Self {
        Self {
            uid: summary.account.uid,
            notification_email: summary.account.notification_email,
            examinations: summary.examinations.into_iter().map(|e| e.into()).collect(),
            self_examinations: summary
                .self_examinations
                .into_iter()
                .map(|r| r.into())
                .collect(),
        }
    }
}

/// FFI-safe clinician examination.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExamination {
    pub record_id: String,
    pub exam_type: String,
    pub date: Option<String>,
    pub status: String,
}

impl From<ExaminationRecord> for FfiExamination {
    fn from(record: ExaminationRecord) -> Self {
        Self {
            record_id: record.record_id,
            exam_type: record.exam_type.to_string(),
            date: record.date.map(|d| d.to_string()),
            status: record.status.as_str().to_string(),
        }
    }
}

/// FFI-safe self-examination record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSelfExamRecord {
    pub record_id: String,
    pub exam_type: String,
    pub due_date: String,
}

impl From<SelfExaminationRecord> for FfiSelfExamRecord {
    fn from(record: SelfExaminationRecord) -> Self {
        Self {
            record_id: record.record_id,
            exam_type: record.exam_type.to_string(),
            due_date: record.due_date.to_string(),
        }
    }
}

/// FFI-safe confirmation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConfirmation {
    pub exam_type: String,
    pub result: String,
    pub previous_due_date: String,
    pub next_due_date: String,
    pub confirmed_on: String,
}

impl From<ScheduleAdvance> for FfiConfirmation {
    fn from(advance: ScheduleAdvance) -> Self {
        Self {
            exam_type: advance.next.exam_type.to_string(),
            result: advance.outcome.result.to_string(),
            previous_due_date: advance.previous.due_date.to_string(),
            next_due_date: advance.next.due_date.to_string(),
            confirmed_on: advance.outcome.confirmed_on.to_string(),
        }
    }
}

/// FFI-safe self-examination status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSelfExamStatus {
    pub exam_type: String,
    pub due_date: Option<String>,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub can_confirm: bool,
}

impl From<SelfExamStatus> for FfiSelfExamStatus {
    fn from(status: SelfExamStatus) -> Self {
        Self {
            exam_type: status.exam_type.to_string(),
            due_date: status.due_date.map(|d| d.to_string()),
            window_start: status.window.map(|w| w.start.to_string()),
            window_end: status.window.map(|w| w.end.to_string()),
            can_confirm: status.can_confirm,
        }
    }
}
