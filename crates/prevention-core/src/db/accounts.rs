//! Account database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{date_from_sql, date_to_sql, examinations, self_examinations, Database, DbError, DbResult};
use crate::models::{Account, ExaminationRecord, SelfExaminationRecord};

impl Database {
    /// Insert a new account.
    pub fn insert_account(&self, account: &Account) -> DbResult<()> {
        insert_account(&self.conn, account)
    }

    /// Get an account by uid.
    pub fn get_account(&self, uid: &str) -> DbResult<Option<Account>> {
        self.conn
            .query_row(
                r#"
                SELECT uid, salutation, email, notification_email, sex, birthdate, created_at
                FROM accounts
                WHERE uid = ?
                "#,
                [uid],
                |row| {
                    Ok(AccountRow {
                        uid: row.get(0)?,
                        salutation: row.get(1)?,
                        email: row.get(2)?,
                        notification_email: row.get(3)?,
                        sex: row.get(4)?,
                        birthdate: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Check whether an account with this uid exists.
    pub fn account_exists(&self, uid: &str) -> DbResult<bool> {
        account_exists(&self.conn, uid)
    }

    /// Store a freshly onboarded account with its examinations and first
    /// self-examination schedule, all or nothing.
    ///
    /// Returns `false` without writing when the uid is already taken.
    pub fn insert_onboarding(
        &self,
        account: &Account,
        exams: &[ExaminationRecord],
        schedule: &[SelfExaminationRecord],
    ) -> DbResult<bool> {
        let tx = self.write_transaction()?;
        if account_exists(&tx, &account.uid)? {
            tracing::debug!(uid = %account.uid, "Onboarding skipped, account exists");
            return Ok(false);
        }
        insert_account(&tx, account)?;
        for record in exams {
            examinations::insert_examination_record(&tx, record)?;
        }
        for record in schedule {
            self_examinations::insert_self_examination_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(true)
    }
}

fn account_exists(conn: &Connection, uid: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE uid = ?",
        [uid],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_account(conn: &Connection, account: &Account) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO accounts (
            uid, salutation, email, notification_email, sex, birthdate, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            account.uid,
            account.salutation,
            account.email,
            account.notification_email,
            account.sex.as_str(),
            account.birthdate.map(date_to_sql),
            account.created_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct AccountRow {
    uid: String,
    salutation: Option<String>,
    email: String,
    notification_email: String,
    sex: String,
    birthdate: Option<String>,
    created_at: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = DbError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let sex = row.sex.parse().map_err(DbError::Constraint)?;
        let birthdate = row.birthdate.as_deref().map(date_from_sql).transpose()?;

        Ok(Account {
            uid: row.uid,
            salutation: row.salutation,
            email: row.email,
            notification_email: row.notification_email,
            sex,
            birthdate,
            created_at: row.created_at,
        })
    }
}
