//! # Relational Store
//!
//! SQLite holds cases and their documents and is the source of truth of the
//! system; the object store only caches files that can be located or
//! regenerated from these rows. Connections are opened per operation, always
//! from the blocking pool.
//!
//! Status transitions lock the database with an `IMMEDIATE` transaction
//! before reading the current status. SQLite has no row locks, so this is
//! how concurrent transitions on one case are serialized.

pub mod cases;
pub mod documents;

use crate::deadline::Deadline;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::time::Duration;

/// Schema steps; `PRAGMA user_version` records how many have run.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE cases (
        id TEXT PRIMARY KEY,
        workflow TEXT NOT NULL,
        status TEXT NOT NULL,
        payload TEXT NOT NULL,
        document_number TEXT,
        document_date TEXT,
        signer_id TEXT,
        note TEXT,
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    );
    CREATE INDEX cases_workflow ON cases (workflow);
    CREATE TABLE documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        case_id TEXT NOT NULL REFERENCES cases (id) ON DELETE CASCADE,
        filename TEXT NOT NULL UNIQUE,
        document_name TEXT NOT NULL,
        role TEXT NOT NULL,
        attendee_id TEXT NOT NULL DEFAULT '',
        document_number TEXT,
        document_date TEXT,
        signer_id TEXT,
        note TEXT,
        created_at TEXT NOT NULL,
        is_signed INTEGER NOT NULL DEFAULT 0,
        signed_at TEXT
    );
    CREATE INDEX documents_case ON documents (case_id);",
];

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Opens the database file, creating it and applying pending migrations.
    pub fn open(path: impl Into<PathBuf>) -> rusqlite::Result<Self> {
        let db = Self { path: path.into() };
        db.migrate()?;
        Ok(db)
    }

    /// A new connection whose lock wait is bounded by the deadline.
    pub fn connect(&self, deadline: &Deadline) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(deadline.remaining().max(Duration::from_millis(1)))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        let mut conn = Connection::open(&self.path)?;
        let tx = immediate(&mut conn)?;
        let applied: i64 = tx.pragma_query_value(None, "user_version", |row| row.get(0))?;
        for (index, step) in MIGRATIONS.iter().enumerate().skip(applied.max(0) as usize) {
            tx.execute_batch(step)?;
            tx.pragma_update(None, "user_version", (index + 1) as i64)?;
            log::info!("applied database migration {}", index + 1);
        }
        tx.commit()
    }
}

/// Starts a transaction that takes the write lock immediately.
pub fn immediate(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

/// Wraps a message into a column conversion error.
pub(crate) fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}
