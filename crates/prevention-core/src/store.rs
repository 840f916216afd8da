//! Collaborator interfaces consumed by the services.
//!
//! [`Database`] implements all of them; tests substitute fakes.

use crate::db::{Database, DbResult};
use crate::models::{Account, SelfExaminationOutcome, SelfExaminationRecord, SelfExaminationType};

/// Resolves user identifiers to accounts.
pub trait AccountLookup {
    fn find_by_uid(&self, uid: &str) -> DbResult<Option<Account>>;
}

/// Persistence for the self-examination schedule.
pub trait SelfExaminationStore {
    /// Records for (account, type), newest due date first; empty if none.
    fn find_all_by_account_and_type(
        &self,
        account_uid: &str,
        exam_type: SelfExaminationType,
    ) -> DbResult<Vec<SelfExaminationRecord>>;

    fn save(&self, record: &SelfExaminationRecord) -> DbResult<()>;

    fn save_all(&self, records: &[SelfExaminationRecord]) -> DbResult<()>;

    /// Persist `next` and `outcome` only if `current` is still the newest
    /// record. Returns whether the write happened.
    fn supersede(
        &self,
        current: &SelfExaminationRecord,
        next: &SelfExaminationRecord,
        outcome: &SelfExaminationOutcome,
    ) -> DbResult<bool>;
}

impl AccountLookup for Database {
    fn find_by_uid(&self, uid: &str) -> DbResult<Option<Account>> {
        self.get_account(uid)
    }
}

impl SelfExaminationStore for Database {
    fn find_all_by_account_and_type(
        &self,
        account_uid: &str,
        exam_type: SelfExaminationType,
    ) -> DbResult<Vec<SelfExaminationRecord>> {
        self.list_self_examination_records(account_uid, exam_type)
    }

    fn save(&self, record: &SelfExaminationRecord) -> DbResult<()> {
        self.insert_self_examination_record(record)
    }

    fn save_all(&self, records: &[SelfExaminationRecord]) -> DbResult<()> {
        self.insert_self_examination_records(records)
    }

    fn supersede(
        &self,
        current: &SelfExaminationRecord,
        next: &SelfExaminationRecord,
        outcome: &SelfExaminationOutcome,
    ) -> DbResult<bool> {
        self.supersede_self_examination(current, next, outcome)
    }
}
