//! Self-examination confirmation.

use super::{PreventionService, ScheduleAdvance, ServiceError, ServiceResult};
use crate::clock::Clock;
use crate::models::{SelfExaminationResult, SelfExaminationType, WindowPosition};
use crate::store::AccountLookup;

/// Validates confirmation requests and hands accepted ones to the
/// [`PreventionService`].
pub struct ExaminationRecordService<'a> {
    accounts: &'a dyn AccountLookup,
    prevention: PreventionService<'a>,
    clock: &'a dyn Clock,
}

impl<'a> ExaminationRecordService<'a> {
    /// Create a new examination record service.
    pub fn new(
        accounts: &'a dyn AccountLookup,
        prevention: PreventionService<'a>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            accounts,
            prevention,
            clock,
        }
    }

    /// Confirm that the user performed a self-examination.
    ///
    /// Nothing is written unless every check passes. The account itself is
    /// never modified.
    pub fn confirm_self_exam(
        &self,
        exam_type: SelfExaminationType,
        result: SelfExaminationResult,
        uid: &str,
    ) -> ServiceResult<ScheduleAdvance> {
        let outcome = self.try_confirm(exam_type, result, uid);
        if let Err(err) = &outcome {
            tracing::warn!(
                uid,
                exam_type = %exam_type,
                result = %result,
                error = %err,
                "Self-examination confirmation rejected"
            );
        }
        outcome
    }

    fn try_confirm(
        &self,
        exam_type: SelfExaminationType,
        result: SelfExaminationResult,
        uid: &str,
    ) -> ServiceResult<ScheduleAdvance> {
        // Step 1: Resolve the account
        let account = self
            .accounts
            .find_by_uid(uid)?
            .ok_or_else(|| ServiceError::AccountNotFound(uid.to_string()))?;

        // Step 2: Eligibility, before any record is read
        if !exam_type.is_eligible(account.sex) {
            return Err(ServiceError::SexNotEligible {
                exam_type: exam_type.to_string(),
                sex: account.sex,
            });
        }

        // Step 3: Current cycle
        let current = self
            .prevention
            .find_current_record(&account, exam_type)?
            .ok_or_else(|| ServiceError::MissingSchedule {
                account_uid: account.uid.clone(),
                exam_type,
            })?;

        // Step 4: Timing window
        let today = self.clock.today();
        let window = self.prevention.confirmation_window(&current);
        match window.position(today) {
            WindowPosition::Early => {
                return Err(ServiceError::TooEarly {
                    exam_type,
                    due_date: current.due_date,
                    window_start: window.start,
                    today,
                })
            }
            WindowPosition::Late => {
                return Err(ServiceError::TooLate {
                    exam_type,
                    due_date: current.due_date,
                    window_end: window.end,
                    today,
                })
            }
            WindowPosition::Inside => {}
        }

        // Step 5: Advance and persist
        let advance = self
            .prevention
            .advance_schedule(&account, &current, result, today)?;

        tracing::info!(
            uid,
            exam_type = %exam_type,
            result = %result,
            next_due = %advance.next.due_date,
            "Self-examination confirmed"
        );
        Ok(advance)
    }
}
