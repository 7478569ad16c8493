//! Keywarden configuration.

use crate::KeywardenError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest accepted license code length.
pub const MIN_CODE_LENGTH: usize = 8;

/// Largest accepted license code length.
pub const MAX_CODE_LENGTH: usize = 128;

/// Largest accepted license duration in either direction (about 100 years).
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// Configuration for license issuance and verification.
///
/// Key and database paths are external configuration; nothing in the
/// library reads a well-known path on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywardenConfig {
    /// PKCS#8 PEM private key. Stored unencrypted.
    pub private_key_path: PathBuf,

    /// SubjectPublicKeyInfo PEM public key, safe to distribute.
    pub public_key_path: PathBuf,

    /// SQLite database holding the `licenses` table.
    pub database_path: PathBuf,

    /// RSA modulus size for newly generated keys.
    pub key_bits: usize,

    /// Code length used by [`LicenseManager::issue_default`](crate::LicenseManager::issue_default).
    pub code_length: usize,

    /// Duration used by [`LicenseManager::issue_default`](crate::LicenseManager::issue_default).
    pub default_duration_days: i64,

    /// How many fresh codes to try when the store reports a collision.
    pub issue_attempts: u32,

    /// How long a store operation may wait on a database lock.
    pub store_timeout_ms: u64,
}

impl Default for KeywardenConfig {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl KeywardenConfig {
    /// Configuration with all files placed under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            private_key_path: dir.join("private_key.pem"),
            public_key_path: dir.join("public_key.pem"),
            database_path: dir.join("licenses.db"),
            key_bits: 2048,
            code_length: 16,
            default_duration_days: 365,
            issue_attempts: 3,
            store_timeout_ms: 5_000,
        }
    }

    /// Platform data directory for keywarden (`dirs::data_dir()/keywarden`).
    pub fn default_dir() -> Result<PathBuf, KeywardenError> {
        dirs::data_dir()
            .map(|base| base.join("keywarden"))
            .ok_or_else(|| {
                KeywardenError::ConfigError("Could not find data directory".to_string())
            })
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KeywardenError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            KeywardenError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            KeywardenError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Store lock timeout as a [`Duration`].
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeywardenError> {
        for (name, path) in [
            ("private_key_path", &self.private_key_path),
            ("public_key_path", &self.public_key_path),
            ("database_path", &self.database_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(KeywardenError::ConfigError(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }
        if self.private_key_path == self.public_key_path {
            return Err(KeywardenError::ConfigError(
                "private_key_path and public_key_path must differ".to_string(),
            ));
        }
        if !(2048..=4096).contains(&self.key_bits) {
            return Err(KeywardenError::ConfigError(format!(
                "key_bits must be between 2048 and 4096, got {}",
                self.key_bits
            )));
        }
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(KeywardenError::ConfigError(format!(
                "code_length must be between {} and {}, got {}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH, self.code_length
            )));
        }
        if !(-MAX_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&self.default_duration_days) {
            return Err(KeywardenError::ConfigError(format!(
                "default_duration_days must be within +/-{}, got {}",
                MAX_DURATION_DAYS, self.default_duration_days
            )));
        }
        if self.issue_attempts == 0 {
            return Err(KeywardenError::ConfigError(
                "issue_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_dir_uses_conventional_file_names() {
        let config = KeywardenConfig::in_dir("/var/lib/keywarden");
        assert_eq!(
            config.private_key_path,
            PathBuf::from("/var/lib/keywarden/private_key.pem")
        );
        assert_eq!(
            config.public_key_path,
            PathBuf::from("/var/lib/keywarden/public_key.pem")
        );
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/keywarden/licenses.db")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_code_length() {
        let mut config = KeywardenConfig::in_dir("/tmp");
        config.code_length = 4;
        assert!(matches!(
            config.validate(),
            Err(KeywardenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_weak_keys() {
        let mut config = KeywardenConfig::in_dir("/tmp");
        config.key_bits = 1024;
        assert!(matches!(
            config.validate(),
            Err(KeywardenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_extreme_durations() {
        let mut config = KeywardenConfig::in_dir("/tmp");
        config.default_duration_days = i64::MIN;
        assert!(matches!(
            config.validate(),
            Err(KeywardenError::ConfigError(_))
        ));

        config.default_duration_days = -MAX_DURATION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = KeywardenConfig::in_dir("/tmp");
        config.issue_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_key_path() {
        let mut config = KeywardenConfig::in_dir("/tmp");
        config.public_key_path = config.private_key_path.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywarden.json");
        std::fs::write(
            &path,
            r#"{"database_path": "/srv/licenses.db", "issue_attempts": 5}"#,
        )
        .unwrap();

        let config = KeywardenConfig::from_json_file(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/licenses.db"));
        assert_eq!(config.issue_attempts, 5);
        assert_eq!(config.code_length, 16);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywarden.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            KeywardenConfig::from_json_file(&path),
            Err(KeywardenError::ConfigError(_))
        ));
    }
}
