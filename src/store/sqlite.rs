//! SQLite license store.
//!
//! One connection guarded by a mutex serialises callers in this process.
//! Other processes sharing the file are handled by SQLite's own locking,
//! bounded by the busy timeout.

use crate::store::{License, LicenseId, LicenseStore, NewLicense};
use crate::KeywardenError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS licenses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        signature TEXT NOT NULL,
        expiration_date TEXT NOT NULL,
        revoked INTEGER NOT NULL DEFAULT 0,
        issued_at TEXT NOT NULL
    );
";

const SELECT_COLUMNS: &str = "SELECT id, code, signature, expiration_date, revoked, issued_at FROM licenses";

/// License store backed by a SQLite database.
pub struct SqliteLicenseStore {
    conn: Mutex<Connection>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, KeywardenError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                KeywardenError::Store(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| store_error("Failed to open license store", e))?;
        debug!(path = %path.display(), "opened license store");
        Self::with_connection(conn, timeout)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, KeywardenError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| store_error("Failed to open in-memory license store", e))?;
        Self::with_connection(conn, Duration::from_secs(5))
    }

    fn with_connection(conn: Connection, timeout: Duration) -> Result<Self, KeywardenError> {
        conn.busy_timeout(timeout)
            .map_err(|e| store_error("Failed to set busy timeout", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| store_error("Failed to create schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, KeywardenError> {
        self.conn
            .lock()
            .map_err(|_| KeywardenError::Store("license store lock poisoned".to_string()))
    }
}

impl LicenseStore for SqliteLicenseStore {
    fn insert(&self, license: &NewLicense<'_>) -> Result<LicenseId, KeywardenError> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO licenses (code, signature, expiration_date, revoked, issued_at) VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                license.code,
                license.signature,
                license.expiration_date,
                license.issued_at,
            ],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(KeywardenError::DuplicateCode {
                    code: license.code.to_string(),
                })
            }
            Err(e) => Err(store_error("Failed to insert license", e)),
        }
    }

    fn fetch(&self, code: &str) -> Result<Option<License>, KeywardenError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE code = ?1", SELECT_COLUMNS),
            params![code],
            license_from_row,
        )
        .optional()
        .map_err(|e| store_error("Failed to fetch license", e))
    }

    fn mark_revoked(&self, code: &str) -> Result<bool, KeywardenError> {
        let conn = self.lock()?;
        // SQLite counts matched rows, so an already revoked license still reports 1
        let changed = conn
            .execute(
                "UPDATE licenses SET revoked = 1 WHERE code = ?1",
                params![code],
            )
            .map_err(|e| store_error("Failed to revoke license", e))?;
        Ok(changed > 0)
    }

    fn list(&self) -> Result<Vec<License>, KeywardenError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .map_err(|e| store_error("Failed to prepare license query", e))?;
        let rows = stmt
            .query_map([], license_from_row)
            .map_err(|e| store_error("Failed to list licenses", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| store_error("Failed to read license row", e))
    }
}

fn license_from_row(row: &Row<'_>) -> rusqlite::Result<License> {
    Ok(License {
        id: row.get(0)?,
        code: row.get(1)?,
        signature: row.get(2)?,
        expiration_date: row.get(3)?,
        revoked: row.get(4)?,
        issued_at: row.get(5)?,
    })
}

fn store_error(context: &str, e: rusqlite::Error) -> KeywardenError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            KeywardenError::StoreTimeout
        }
        other => KeywardenError::Store(format!("{}: {}", context, other)),
    }
}
