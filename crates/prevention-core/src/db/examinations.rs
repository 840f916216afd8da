//! Clinician examination database operations.

use rusqlite::{params, Connection};

use super::{date_from_sql, date_to_sql, Database, DbError, DbResult};
use crate::models::ExaminationRecord;

impl Database {
    /// Insert a clinician examination record.
    pub fn insert_examination_record(&self, record: &ExaminationRecord) -> DbResult<()> {
        insert_examination_record(&self.conn, record)
    }

    /// List clinician examinations for an account, ordered by type.
    pub fn list_examination_records(&self, account_uid: &str) -> DbResult<Vec<ExaminationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, account_uid, exam_type, date, status, created_at
            FROM examination_records
            WHERE account_uid = ?
            ORDER BY exam_type, rowid
            "#,
        )?;

        let rows = stmt.query_map([account_uid], |row| {
            Ok(ExaminationRow {
                record_id: row.get(0)?,
                account_uid: row.get(1)?,
                exam_type: row.get(2)?,
                date: row.get(3)?,
                status: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

pub(super) fn insert_examination_record(conn: &Connection, record: &ExaminationRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO examination_records (
            record_id, account_uid, exam_type, date, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            record.record_id,
            record.account_uid,
            record.exam_type.as_str(),
            record.date.map(date_to_sql),
            record.status.as_str(),
            record.created_at,
        ],
    )?;
    Ok(())
}

struct ExaminationRow {
    record_id: String,
    account_uid: String,
    exam_type: String,
    date: Option<String>,
    status: String,
    created_at: String,
}

impl TryFrom<ExaminationRow> for ExaminationRecord {
    type Error = DbError;

    fn try_from(row: ExaminationRow) -> Result<Self, Self::Error> {
        Ok(ExaminationRecord {
            record_id: row.record_id,
            account_uid: row.account_uid,
            exam_type: row.exam_type.parse().map_err(DbError::Constraint)?,
            date: row.date.as_deref().map(date_from_sql).transpose()?,
            status: row.status.parse().map_err(DbError::Constraint)?,
            created_at: row.created_at,
        })
    }
}
