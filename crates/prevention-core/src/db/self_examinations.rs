//! Self-examination schedule and outcome database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{date_from_sql, date_to_sql, Database, DbError, DbResult};
use crate::models::{SelfExaminationOutcome, SelfExaminationRecord, SelfExaminationType};

impl Database {
    /// Insert a scheduled self-examination record.
    pub fn insert_self_examination_record(&self, record: &SelfExaminationRecord) -> DbResult<()> {
        insert_self_examination_record(&self.conn, record)
    }

    /// Insert several records in one transaction.
    pub fn insert_self_examination_records(&self, records: &[SelfExaminationRecord]) -> DbResult<()> {
        let tx = self.write_transaction()?;
        for record in records {
            insert_self_examination_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// All records for (account, type), newest due date first.
    ///
    /// Equal due dates fall back to insertion order, latest first.
    pub fn list_self_examination_records(
        &self,
        account_uid: &str,
        exam_type: SelfExaminationType,
    ) -> DbResult<Vec<SelfExaminationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, account_uid, exam_type, due_date, created_at
            FROM self_examination_records
            WHERE account_uid = ?1 AND exam_type = ?2
            ORDER BY due_date DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map(params![account_uid, exam_type.as_str()], |row| {
            Ok(SelfExaminationRow {
                record_id: row.get(0)?,
                account_uid: row.get(1)?,
                exam_type: row.get(2)?,
                due_date: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Atomically close `current` and schedule `next`.
    ///
    /// Returns `false` without writing anything when `current` is no longer the
    /// newest record for its (account, type).
    pub fn supersede_self_examination(
        &self,
        current: &SelfExaminationRecord,
        next: &SelfExaminationRecord,
        outcome: &SelfExaminationOutcome,
    ) -> DbResult<bool> {
        let tx = self.write_transaction()?;

        let latest: Option<String> = tx
            .query_row(
                r#"
                SELECT record_id
                FROM self_examination_records
                WHERE account_uid = ?1 AND exam_type = ?2
                ORDER BY due_date DESC, rowid DESC
                LIMIT 1
                "#,
                params![current.account_uid, current.exam_type.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if latest.as_deref() != Some(current.record_id.as_str()) {
            tracing::debug!(
                record_id = %current.record_id,
                latest = ?latest,
                "Current self-examination record was superseded concurrently"
            );
            return Ok(false);
        }

        insert_self_examination_record(&tx, next)?;
        insert_outcome(&tx, outcome)?;
        tx.commit()?;
        Ok(true)
    }

    /// Outcomes recorded for (account, type), most recent confirmation first.
    pub fn list_self_examination_outcomes(
        &self,
        account_uid: &str,
        exam_type: SelfExaminationType,
    ) -> DbResult<Vec<SelfExaminationOutcome>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT outcome_id, record_id, account_uid, exam_type, result, confirmed_on, created_at
            FROM self_examination_outcomes
            WHERE account_uid = ?1 AND exam_type = ?2
            ORDER BY confirmed_on DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map(params![account_uid, exam_type.as_str()], |row| {
            Ok(OutcomeRow {
                outcome_id: row.get(0)?,
                record_id: row.get(1)?,
                account_uid: row.get(2)?,
                exam_type: row.get(3)?,
                result: row.get(4)?,
                confirmed_on: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        let mut outcomes = Vec::new();
        for row in rows {
            outcomes.push(row?.try_into()?);
        }
        Ok(outcomes)
    }
}

pub(super) fn insert_self_examination_record(
    conn: &Connection,
    record: &SelfExaminationRecord,
) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO self_examination_records (
            record_id, account_uid, exam_type, due_date, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            record.record_id,
            record.account_uid,
            record.exam_type.as_str(),
            date_to_sql(record.due_date),
            record.created_at,
        ],
    )?;
    Ok(())
}

fn insert_outcome(conn: &Connection, outcome: &SelfExaminationOutcome) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO self_examination_outcomes (
            outcome_id, record_id, account_uid, exam_type, result, confirmed_on, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            outcome.outcome_id,
            outcome.record_id,
            outcome.account_uid,
            outcome.exam_type.as_str(),
            outcome.result.as_str(),
            date_to_sql(outcome.confirmed_on),
            outcome.created_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct SelfExaminationRow {
    record_id: String,
    account_uid: String,
    exam_type: String,
    due_date: String,
    created_at: String,
}

impl TryFrom<SelfExaminationRow> for SelfExaminationRecord {
    type Error = DbError;

    fn try_from(row: SelfExaminationRow) -> Result<Self, Self::Error> {
        Ok(SelfExaminationRecord {
            record_id: row.record_id,
            account_uid: row.account_uid,
            exam_type: row.exam_type.parse().map_err(DbError::Constraint)?,
            due_date: date_from_sql(&row.due_date)?,
            created_at: row.created_at,
        })
    }
}

struct OutcomeRow {
    outcome_id: String,
    record_id: String,
    account_uid: String,
    exam_type: String,
    result: String,
    confirmed_on: String,
    created_at: String,
}

impl TryFrom<OutcomeRow> for SelfExaminationOutcome {
    type Error = DbError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        Ok(SelfExaminationOutcome {
            outcome_id: row.outcome_id,
            record_id: row.record_id,
            account_uid: row.account_uid,
            exam_type: row.exam_type.parse().map_err(DbError::Constraint)?,
            result: row.result.parse().map_err(DbError::Constraint)?,
            confirmed_on: date_from_sql(&row.confirmed_on)?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, SelfExaminationResult, Sex};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let account = Account::new("101".into(), "a@b.cz".into(), Sex::Female);
        db.insert_account(&account).unwrap();
        db
    }

    fn record(due: NaiveDate) -> SelfExaminationRecord {
        SelfExaminationRecord::new("101".into(), SelfExaminationType::Breast, due)
    }

    #[test]
    fn test_list_newest_due_first() {
        let db = setup_db();
        db.insert_self_examination_records(&[
            record(date(2024, 2, 1)),
            record(date(2024, 4, 1)),
            record(date(2024, 3, 1)),
        ])
        .unwrap();

        let records = db
            .list_self_examination_records("101", SelfExaminationType::Breast)
            .unwrap();
        let dues: Vec<_> = records.iter().map(|r| r.due_date).collect();
        assert_eq!(dues, vec![date(2024, 4, 1), date(2024, 3, 1), date(2024, 2, 1)]);
    }

    #[test]
    fn test_list_filters_by_type() {
        let db = setup_db();
        db.insert_self_examination_record(&record(date(2024, 2, 1))).unwrap();

        let skin = db
            .list_self_examination_records("101", SelfExaminationType::Skin)
            .unwrap();
        assert!(skin.is_empty());
    }

    #[test]
    fn test_supersede_writes_next_and_outcome() {
        let db = setup_db();
        let current = record(date(2024, 2, 1));
        db.insert_self_examination_record(&current).unwrap();

        let next = record(date(2024, 3, 1));
        let outcome = SelfExaminationOutcome::new(&current, SelfExaminationResult::Ok, date(2024, 2, 1));
        assert!(db.supersede_self_examination(&current, &next, &outcome).unwrap());

        let records = db
            .list_self_examination_records("101", SelfExaminationType::Breast)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], next);
        assert_eq!(records[1], current);

        let outcomes = db
            .list_self_examination_outcomes("101", SelfExaminationType::Breast)
            .unwrap();
        assert_eq!(outcomes, vec![outcome]);
    }

    #[test]
    fn test_supersede_stale_record_writes_nothing() {
        let db = setup_db();
        let current = record(date(2024, 2, 1));
        db.insert_self_examination_record(&current).unwrap();

        let first_next = record(date(2024, 3, 1));
        let first_outcome =
            SelfExaminationOutcome::new(&current, SelfExaminationResult::Ok, date(2024, 2, 1));
        assert!(db
            .supersede_self_examination(&current, &first_next, &first_outcome)
            .unwrap());

        // A second advancement from the same starting record must lose
        let second_next = record(date(2024, 2, 15));
        let second_outcome =
            SelfExaminationOutcome::new(&current, SelfExaminationResult::Finding, date(2024, 2, 1));
        assert!(!db
            .supersede_self_examination(&current, &second_next, &second_outcome)
            .unwrap());

        let records = db
            .list_self_examination_records("101", SelfExaminationType::Breast)
            .unwrap();
        assert_eq!(records.len(), 2);
        let outcomes = db
            .list_self_examination_outcomes("101", SelfExaminationType::Breast)
            .unwrap();
        assert_eq!(outcomes.len(), 1);
    }
}
