//! Due-date computation and schedule advancement.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{ServiceError, ServiceResult};
use crate::config::PreventionPolicy;
use crate::models::{
    Account, ConfirmationWindow, SelfExaminationOutcome, SelfExaminationRecord,
    SelfExaminationResult, SelfExaminationType,
};
use crate::store::SelfExaminationStore;

/// A cycle closed by a confirmation and the cycle that replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleAdvance {
    /// The record that was current when the confirmation was validated
    pub previous: SelfExaminationRecord,
    /// Newly scheduled record, now current
    pub next: SelfExaminationRecord,
    /// Outcome row closing `previous`
    pub outcome: SelfExaminationOutcome,
}

/// Where an account stands for one self-examination type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelfExamStatus {
    pub exam_type: SelfExaminationType,
    /// Due date of the current record, if one is scheduled
    pub due_date: Option<NaiveDate>,
    /// Confirmation window around `due_date`
    pub window: Option<ConfirmationWindow>,
    /// Whether `today` falls inside the window
    pub can_confirm: bool,
}

/// Owns the per-type scheduling policy.
pub struct PreventionService<'a> {
    store: &'a dyn SelfExaminationStore,
    policy: &'a PreventionPolicy,
}

impl<'a> PreventionService<'a> {
    /// Create a new prevention service.
    pub fn new(store: &'a dyn SelfExaminationStore, policy: &'a PreventionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &PreventionPolicy {
        self.policy
    }

    /// The record with the greatest due date, if any.
    pub fn find_current_record(
        &self,
        account: &Account,
        exam_type: SelfExaminationType,
    ) -> ServiceResult<Option<SelfExaminationRecord>> {
        let records = self
            .store
            .find_all_by_account_and_type(&account.uid, exam_type)?;
        Ok(records.into_iter().next())
    }

    /// Accepted confirmation dates for a record.
    pub fn confirmation_window(&self, record: &SelfExaminationRecord) -> ConfirmationWindow {
        ConfirmationWindow::around(
            record.due_date,
            self.policy.tolerance_days_before,
            self.policy.tolerance_days_after,
        )
    }

    /// Next due date after `current_due`. A finding uses the shorter
    /// follow-up interval.
    pub fn next_due_date(
        &self,
        exam_type: SelfExaminationType,
        current_due: NaiveDate,
        result: SelfExaminationResult,
    ) -> ServiceResult<NaiveDate> {
        let interval = self.policy.interval_for(exam_type);
        let next = if result.needs_follow_up() {
            current_due.checked_add_days(Days::new(u64::from(interval.follow_up_days)))
        } else {
            current_due.checked_add_months(Months::new(interval.regular_months))
        };

        match next {
            Some(next) if next > current_due => Ok(next),
            _ => Err(ServiceError::ScheduleOverflow {
                exam_type,
                due_date: current_due,
            }),
        }
    }

    /// Build the next record and the outcome closing `current`, without
    /// persisting anything.
    pub fn plan_advance(
        &self,
        current: &SelfExaminationRecord,
        result: SelfExaminationResult,
        confirmed_on: NaiveDate,
    ) -> ServiceResult<ScheduleAdvance> {
        let next_due = self.next_due_date(current.exam_type, current.due_date, result)?;
        let next = SelfExaminationRecord::new(current.account_uid.clone(), current.exam_type, next_due);
        let outcome = SelfExaminationOutcome::new(current, result, confirmed_on);

        Ok(ScheduleAdvance {
            previous: current.clone(),
            next,
            outcome,
        })
    }

    /// Close `current` and schedule the next cycle.
    ///
    /// Fails with `ScheduleConflict` when `current` has been superseded since
    /// it was read; prior records are never modified.
    pub fn advance_schedule(
        &self,
        account: &Account,
        current: &SelfExaminationRecord,
        result: SelfExaminationResult,
        confirmed_on: NaiveDate,
    ) -> ServiceResult<ScheduleAdvance> {
        let advance = self.plan_advance(current, result, confirmed_on)?;

        if !self
            .store
            .supersede(&advance.previous, &advance.next, &advance.outcome)?
        {
            return Err(ServiceError::ScheduleConflict {
                account_uid: account.uid.clone(),
                exam_type: current.exam_type,
            });
        }

        tracing::debug!(
            account_uid = %account.uid,
            exam_type = %current.exam_type,
            previous_due = %advance.previous.due_date,
            next_due = %advance.next.due_date,
            "Self-examination schedule advanced"
        );
        Ok(advance)
    }

    /// First record for a type, `first_due_offset_days` after `today`.
    pub fn first_record(
        &self,
        account_uid: &str,
        exam_type: SelfExaminationType,
        today: NaiveDate,
    ) -> ServiceResult<SelfExaminationRecord> {
        let due = today
            .checked_add_days(Days::new(u64::from(self.policy.first_due_offset_days)))
            .ok_or(ServiceError::ScheduleOverflow {
                exam_type,
                due_date: today,
            })?;
        Ok(SelfExaminationRecord::new(account_uid.to_string(), exam_type, due))
    }

    /// Start the cycle for a type with no schedule yet. Returns the existing
    /// current record unchanged when one is already scheduled.
    pub fn schedule_first(
        &self,
        account: &Account,
        exam_type: SelfExaminationType,
        today: NaiveDate,
    ) -> ServiceResult<SelfExaminationRecord> {
        if !exam_type.is_eligible(account.sex) {
            return Err(ServiceError::SexNotEligible {
                exam_type: exam_type.to_string(),
                sex: account.sex,
            });
        }
        if let Some(current) = self.find_current_record(account, exam_type)? {
            return Ok(current);
        }

        let record = self.first_record(&account.uid, exam_type, today)?;
        self.store.save(&record)?;
        Ok(record)
    }

    /// Current schedule for every self-examination the account is eligible for.
    pub fn prevention_status(
        &self,
        account: &Account,
        today: NaiveDate,
    ) -> ServiceResult<Vec<SelfExamStatus>> {
        SelfExaminationType::eligible_for(account.sex)
            .into_iter()
            .map(|exam_type| {
                let current = self.find_current_record(account, exam_type)?;
                let window = current.as_ref().map(|record| self.confirmation_window(record));
                Ok(SelfExamStatus {
                    exam_type,
                    due_date: current.map(|record| record.due_date),
                    window,
                    can_confirm: window.map(|w| w.contains(today)).unwrap_or(false),
                })
            })
            .collect()
    }
}
