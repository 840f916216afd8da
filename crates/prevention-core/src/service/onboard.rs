//! Account onboarding.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{PreventionService, ServiceError, ServiceResult};
use crate::clock::Clock;
use crate::config::PreventionPolicy;
use crate::db::Database;
use crate::models::{Account, ExaminationRecord, ExaminationType, SelfExaminationRecord, SelfExaminationType, Sex};

/// User profile submitted at onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardUser {
    pub uid: String,
    pub salutation: Option<String>,
    pub email: String,
    /// Falls back to `email` when missing or empty
    pub notification_email: Option<String>,
    pub sex: Sex,
    pub birthdate: Option<NaiveDate>,
}

/// A clinician examination the user reports at onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardExamination {
    pub exam_type: ExaminationType,
    /// Date of the last visit, if the user remembers it
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardRequest {
    pub user: OnboardUser,
    #[serde(default)]
    pub examinations: Vec<OnboardExamination>,
}

/// Everything written by a successful onboarding.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardSummary {
    pub account: Account,
    pub examinations: Vec<ExaminationRecord>,
    pub self_examinations: Vec<SelfExaminationRecord>,
}

/// Creates accounts with their initial examination state.
pub struct OnboardService<'a> {
    db: &'a Database,
    policy: &'a PreventionPolicy,
    clock: &'a dyn Clock,
}

impl<'a> OnboardService<'a> {
    pub fn new(db: &'a Database, policy: &'a PreventionPolicy, clock: &'a dyn Clock) -> Self {
        Self { db, policy, clock }
    }

    /// Store the account, its clinician examinations and the first cycle of
    /// every eligible self-examination in one transaction.
    pub fn onboard(&self, request: &OnboardRequest) -> ServiceResult<OnboardSummary> {
        let account = to_account(&request.user)?;
        let examinations = to_examinations(&account, &request.examinations)?;

        let prevention = PreventionService::new(self.db, self.policy);
        let today = self.clock.today();
        let self_examinations = SelfExaminationType::eligible_for(account.sex)
            .into_iter()
            .map(|exam_type| prevention.first_record(&account.uid, exam_type, today))
            .collect::<ServiceResult<Vec<_>>>()?;

        // Uid uniqueness is checked inside the write transaction
        if !self
            .db
            .insert_onboarding(&account, &examinations, &self_examinations)?
        {
            return Err(ServiceError::InvalidInput(format!(
                "Account already exists: {}",
                account.uid
            )));
        }

        tracing::info!(
            uid = %account.uid,
            sex = %account.sex,
            examinations = examinations.len(),
            self_examinations = self_examinations.len(),
            "Account onboarded"
        );

        Ok(OnboardSummary {
            account,
            examinations,
            self_examinations,
        })
    }
}

fn to_account(user: &OnboardUser) -> ServiceResult<Account> {
    let uid = user.uid.trim();
    if uid.is_empty() {
        return Err(ServiceError::InvalidInput("uid must not be empty".into()));
    }
    let email = user.email.trim();
    if email.is_empty() {
        return Err(ServiceError::InvalidInput("email must not be empty".into()));
    }

    let mut account = Account::new(uid.to_string(), email.to_string(), user.sex);
    account.salutation = user.salutation.clone();
    account.birthdate = user.birthdate;
    if let Some(notification_email) = user
        .notification_email
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        account.notification_email = notification_email.to_string();
    }
    Ok(account)
}

fn to_examinations(
    account: &Account,
    examinations: &[OnboardExamination],
) -> ServiceResult<Vec<ExaminationRecord>> {
    let mut seen = HashSet::new();
    examinations
        .iter()
        .map(|exam| {
            if !exam.exam_type.is_eligible(account.sex) {
                return Err(ServiceError::SexNotEligible {
                    exam_type: exam.exam_type.to_string(),
                    sex: account.sex,
                });
            }
            if !seen.insert(exam.exam_type) {
                return Err(ServiceError::InvalidInput(format!(
                    "Duplicate examination: {}",
                    exam.exam_type
                )));
            }
            Ok(ExaminationRecord::new(account.uid.clone(), exam.exam_type, exam.date))
        })
        .collect()
}
