//! Keywarden error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while issuing, verifying or revoking licenses.
///
/// A license that fails verification is not an error: see
/// [`ValidationReason`](crate::ValidationReason). Variants here are either
/// bad input or infrastructure failures the caller has to see.
#[derive(Debug, Error)]
pub enum KeywardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A caller-supplied parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Key pair generation or persistence failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A key file does not exist. Run initialization first.
    #[error("Key file not found: {}", path.display())]
    KeyNotFound {
        /// Path that was expected to hold the key.
        path: PathBuf,
    },

    /// A key file exists but could not be parsed, or the pair does not match.
    #[error("Key file corrupt: {0}")]
    KeyCorrupt(String),

    /// Signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A stored signature could not be decoded.
    #[error("Signature encoding error: {0}")]
    Encoding(String),

    /// A license with this code already exists.
    #[error("License code already exists: {code}")]
    DuplicateCode {
        /// The colliding code.
        code: String,
    },

    /// Every issuance attempt collided with an existing code.
    #[error("License issuance gave up after {attempts} colliding codes")]
    IssuanceExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// License store I/O error.
    #[error("License store error: {0}")]
    Store(String),

    /// The license store stayed locked past the configured timeout.
    #[error("License store timed out waiting for a lock")]
    StoreTimeout,
}

impl KeywardenError {
    /// Whether this error came from the environment (keys, store, encoding)
    /// rather than from caller input.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(
            self,
            KeywardenError::ConfigError(_)
                | KeywardenError::InvalidParameter(_)
                | KeywardenError::DuplicateCode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_message_names_path() {
        let err = KeywardenError::KeyNotFound {
            path: PathBuf::from("/tmp/keys/private_key.pem"),
        };
        assert_eq!(
            err.to_string(),
            "Key file not found: /tmp/keys/private_key.pem"
        );
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(KeywardenError::StoreTimeout.is_infrastructure());
        assert!(KeywardenError::Encoding("odd length".into()).is_infrastructure());
        assert!(KeywardenError::IssuanceExhausted { attempts: 3 }.is_infrastructure());
        assert!(!KeywardenError::InvalidParameter("length".into()).is_infrastructure());
        assert!(!KeywardenError::DuplicateCode {
            code: "ABCDEFGH".into()
        }
        .is_infrastructure());
    }
}
