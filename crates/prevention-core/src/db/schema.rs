//! SQLite schema definition.

/// Complete database schema for the prevention core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Accounts
-- ============================================================================

CREATE TABLE IF NOT EXISTS accounts (
    uid TEXT PRIMARY KEY,
    salutation TEXT,
    email TEXT NOT NULL,
    notification_email TEXT NOT NULL,
    sex TEXT NOT NULL CHECK (sex IN ('FEMALE', 'MALE', 'OTHER')),
    birthdate TEXT,                              -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Clinician Examinations
-- ============================================================================

CREATE TABLE IF NOT EXISTS examination_records (
    record_id TEXT PRIMARY KEY,
    account_uid TEXT NOT NULL REFERENCES accounts(uid),
    exam_type TEXT NOT NULL,
    date TEXT,                                   -- YYYY-MM-DD, NULL if unknown
    status TEXT NOT NULL DEFAULT 'NEW' CHECK (status IN ('NEW', 'CONFIRMED')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_examinations_account ON examination_records(account_uid, exam_type);

-- ============================================================================
-- Self-Examination Schedule (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS self_examination_records (
    record_id TEXT PRIMARY KEY,
    account_uid TEXT NOT NULL REFERENCES accounts(uid),
    exam_type TEXT NOT NULL,
    due_date TEXT NOT NULL,                      -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Due dates are strictly ordered per (account, type)
CREATE UNIQUE INDEX IF NOT EXISTS idx_self_exam_due
    ON self_examination_records(account_uid, exam_type, due_date);

CREATE TRIGGER IF NOT EXISTS self_examination_records_no_update
BEFORE UPDATE ON self_examination_records
BEGIN
    SELECT RAISE(ABORT, 'Self-examination records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS self_examination_records_no_delete
BEFORE DELETE ON self_examination_records
BEGIN
    SELECT RAISE(ABORT, 'Self-examination records are immutable');
END;

-- ============================================================================
-- Self-Examination Outcomes
-- ============================================================================

CREATE TABLE IF NOT EXISTS self_examination_outcomes (
    outcome_id TEXT PRIMARY KEY,
    record_id TEXT NOT NULL UNIQUE REFERENCES self_examination_records(record_id),
    account_uid TEXT NOT NULL REFERENCES accounts(uid),
    exam_type TEXT NOT NULL,
    result TEXT NOT NULL CHECK (result IN ('OK', 'FINDING')),
    confirmed_on TEXT NOT NULL,                  -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_outcomes_account ON self_examination_outcomes(account_uid, exam_type);
"#;
