//! License Manager - the main public API for Keywarden.
//!
//! The `LicenseManager` runs the license lifecycle:
//! - Issue: generate code, sign it, persist it
//! - Verify: look up, check revocation and expiry, check the signature
//! - Revoke: flip the persisted revoked flag

use crate::clock::{Clock, SystemClock};
use crate::codegen::{validate_length, CodeGenerator, SecureCodeGenerator};
use crate::config::{KeywardenConfig, MAX_DURATION_DAYS};
use crate::crypto::{
    digest::public_key_fingerprint,
    encoding::{decode_signature, encode_signature},
    signing::sign_code,
    verify::verify_signature,
};
use crate::keys::{file::PemFileKeyProvider, KeyPair, KeyPairProvider};
use crate::store::{sqlite::SqliteLicenseStore, License, LicenseId, LicenseStore, NewLicense};
use crate::KeywardenError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a license did or did not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    /// Signature checks out and the license is live.
    Valid,
    /// No license with this code.
    NotFound,
    /// The license was revoked.
    Revoked,
    /// The license is past its expiration date.
    Expired,
    /// The stored signature does not match the code under this key.
    TamperedOrInvalid,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationReason::Valid => "VALID",
            ValidationReason::NotFound => "NOT_FOUND",
            ValidationReason::Revoked => "REVOKED",
            ValidationReason::Expired => "EXPIRED",
            ValidationReason::TamperedOrInvalid => "TAMPERED_OR_INVALID",
        })
    }
}

/// License validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the license is valid.
    pub valid: bool,

    /// Outcome of the check.
    pub reason: ValidationReason,

    /// Expiration date, when the license exists.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ValidationResult {
    fn rejected(reason: ValidationReason, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            valid: false,
            reason,
            expires_at,
        }
    }
}

/// A freshly issued license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedLicense {
    /// Store-assigned id.
    pub id: LicenseId,

    /// The code to hand to the customer.
    pub code: String,

    /// When the license stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// Main license manager for Keywarden.
///
/// Create one instance per process and share it; it is `Send + Sync` and
/// every operation is a short, independent unit of work.
pub struct LicenseManager {
    config: KeywardenConfig,
    clock: Arc<dyn Clock>,
    keys: KeyPair,
    codes: Arc<dyn CodeGenerator>,
    store: Arc<dyn LicenseStore>,
}

impl LicenseManager {
    /// Create a license manager from configuration.
    ///
    /// Loads the key pair from the configured PEM files and opens the
    /// configured SQLite store. Uses the system clock.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The key files are missing or corrupt
    /// - The store cannot be opened
    pub fn new(config: KeywardenConfig) -> Result<Self, KeywardenError> {
        config.validate()?;
        let provider = PemFileKeyProvider::from_config(&config);
        let store = SqliteLicenseStore::open(&config.database_path, config.store_timeout())?;
        Self::from_parts(config, &provider, Arc::new(store))
    }

    /// Create a license manager from an injected key provider and store.
    pub fn from_parts(
        config: KeywardenConfig,
        provider: &dyn KeyPairProvider,
        store: Arc<dyn LicenseStore>,
    ) -> Result<Self, KeywardenError> {
        config.validate()?;
        let keys = provider.load_key_pair()?;
        debug!(bits = keys.bits(), "license signing key loaded");

        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            keys,
            codes: Arc::new(SecureCodeGenerator),
            store,
        })
    }

    /// Create a license manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: KeywardenConfig,
        provider: &dyn KeyPairProvider,
        store: Arc<dyn LicenseStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeywardenError> {
        let mut manager = Self::from_parts(config, provider, store)?;
        manager.clock = clock;
        Ok(manager)
    }

    /// Replace the code generator.
    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Issue a license with a `length`-character code valid for
    /// `duration_days` from now.
    ///
    /// Negative durations are accepted and produce an already expired
    /// license. Code collisions are retried with a fresh code up to
    /// `issue_attempts` times.
    ///
    /// # Errors
    /// - `InvalidParameter` - Length or duration out of range
    /// - `Signing` - The RSA operation failed
    /// - `IssuanceExhausted` - Every attempt collided
    /// - `Store` / `StoreTimeout` - The store failed
    pub fn issue(&self, length: usize, duration_days: i64) -> Result<IssuedLicense, KeywardenError> {
        validate_length(length)?;
        if !(-MAX_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&duration_days) {
            return Err(KeywardenError::InvalidParameter(format!(
                "duration must be within +/-{} days, got {}",
                MAX_DURATION_DAYS, duration_days
            )));
        }

        let attempts = self.config.issue_attempts;
        for attempt in 1..=attempts {
            let code = self.codes.generate(length)?;
            let issued_at = self.clock.now_utc();
            let expires_at = issued_at + Duration::days(duration_days);

            let signature = encode_signature(&sign_code(self.keys.private_key(), code.as_bytes())?);
            let new_license = NewLicense {
                code: &code,
                signature: &signature,
                expiration_date: expires_at,
                issued_at,
            };

            match self.store.insert(&new_license) {
                Ok(id) => {
                    info!(id, %expires_at, "license issued");
                    return Ok(IssuedLicense {
                        id,
                        code,
                        expires_at,
                    });
                }
                Err(KeywardenError::DuplicateCode { .. }) => {
                    warn!(attempt, attempts, "license code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(KeywardenError::IssuanceExhausted { attempts })
    }

    /// Issue a license with the configured default length and duration.
    pub fn issue_default(&self) -> Result<IssuedLicense, KeywardenError> {
        self.issue(self.config.code_length, self.config.default_duration_days)
    }

    /// Verify a license code.
    ///
    /// Checks run cheapest first: existence, revocation, expiry, then the
    /// signature. A license that fails any of them is reported through
    /// [`ValidationReason`], not as an error.
    ///
    /// # Errors
    /// - `Encoding` - The stored signature is not valid hex
    /// - `Store` / `StoreTimeout` - The store failed
    pub fn verify(&self, code: &str) -> Result<ValidationResult, KeywardenError> {
        let Some(license) = self.store.fetch(code)? else {
            debug!("license not found");
            return Ok(ValidationResult::rejected(ValidationReason::NotFound, None));
        };
        let expires_at = Some(license.expiration_date);

        if license.revoked {
            return Ok(ValidationResult::rejected(ValidationReason::Revoked, expires_at));
        }

        if license.expiration_date < self.clock.now_utc() {
            return Ok(ValidationResult::rejected(ValidationReason::Expired, expires_at));
        }

        let signature = decode_signature(&license.signature)?;
        if !verify_signature(self.keys.public_key(), license.code.as_bytes(), &signature) {
            warn!(id = license.id, "license signature does not verify");
            return Ok(ValidationResult::rejected(
                ValidationReason::TamperedOrInvalid,
                expires_at,
            ));
        }

        Ok(ValidationResult {
            valid: true,
            reason: ValidationReason::Valid,
            expires_at,
        })
    }

    /// Revoke a license. Returns whether the code exists.
    ///
    /// Revoking an already revoked license succeeds and returns `true`.
    pub fn revoke(&self, code: &str) -> Result<bool, KeywardenError> {
        let found = self.store.mark_revoked(code)?;
        if found {
            info!("license revoked");
        } else {
            debug!("revocation requested for unknown license");
        }
        Ok(found)
    }

    /// All stored licenses in issuance order.
    pub fn list(&self) -> Result<Vec<License>, KeywardenError> {
        self.store.list()
    }

    /// Current time as seen by this manager.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    /// Fingerprint of the public key licenses are verified against.
    pub fn key_fingerprint(&self) -> Result<String, KeywardenError> {
        public_key_fingerprint(self.keys.public_key())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &KeywardenConfig {
        &self.config
    }
}

/// Generate the key pair and create the license schema.
///
/// Refuses to replace an existing private key unless `force` is set, since
/// doing so invalidates every license already issued.
///
/// Returns the new public key fingerprint.
pub fn initialize(config: &KeywardenConfig, force: bool) -> Result<String, KeywardenError> {
    config.validate()?;
    let provider = PemFileKeyProvider::from_config(config);
    if provider.private_key_exists() && !force {
        return Err(KeywardenError::KeyGeneration(format!(
            "{} already exists; pass force to replace it",
            config.private_key_path.display()
        )));
    }

    SqliteLicenseStore::open(&config.database_path, config.store_timeout())?;
    let keys = provider.generate_key_pair()?;
    public_key_fingerprint(keys.public_key())
}
