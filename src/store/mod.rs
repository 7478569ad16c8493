//! Persistent license records.

pub mod sqlite;

use crate::KeywardenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned license row id.
pub type LicenseId = i64;

/// A persisted license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Store-assigned id.
    pub id: LicenseId,

    /// The license code, which is also the signed message.
    pub code: String,

    /// Hex-encoded signature over `code`.
    pub signature: String,

    /// The license is invalid once the current time is past this instant.
    pub expiration_date: DateTime<Utc>,

    /// Set once by revocation, never cleared.
    pub revoked: bool,

    /// When the license was issued.
    pub issued_at: DateTime<Utc>,
}

impl License {
    /// Status derived from stored state alone. The signature is not checked.
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.revoked {
            LicenseStatus::Revoked
        } else if self.expiration_date < now {
            LicenseStatus::Expired
        } else {
            LicenseStatus::Issued
        }
    }
}

/// Lifecycle state of a stored license, computed at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    /// Issued, unexpired, not revoked.
    Issued,
    /// Past its expiration date.
    Expired,
    /// Revoked.
    Revoked,
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LicenseStatus::Issued => "ISSUED",
            LicenseStatus::Expired => "EXPIRED",
            LicenseStatus::Revoked => "REVOKED",
        })
    }
}

/// Fields supplied when inserting a license.
#[derive(Debug, Clone)]
pub struct NewLicense<'a> {
    /// Candidate code.
    pub code: &'a str,
    /// Hex-encoded signature over `code`.
    pub signature: &'a str,
    /// Expiration instant.
    pub expiration_date: DateTime<Utc>,
    /// Issuance instant.
    pub issued_at: DateTime<Utc>,
}

/// Durable license storage.
///
/// Implementations must make each operation atomic with respect to
/// concurrent callers and must enforce code uniqueness.
pub trait LicenseStore: Send + Sync {
    /// Insert a new license.
    ///
    /// # Errors
    /// * `DuplicateCode` - The code is taken; nothing was written.
    /// * `StoreTimeout` - The store stayed locked past its timeout.
    /// * `Store` - Any other storage failure.
    fn insert(&self, license: &NewLicense<'_>) -> Result<LicenseId, KeywardenError>;

    /// Look up a license by code.
    fn fetch(&self, code: &str) -> Result<Option<License>, KeywardenError>;

    /// Set the revoked flag. Returns whether the code exists; revoking an
    /// already revoked license returns `true`.
    fn mark_revoked(&self, code: &str) -> Result<bool, KeywardenError>;

    /// All licenses in issuance order.
    fn list(&self) -> Result<Vec<License>, KeywardenError>;
}
