//! License code generation.

use crate::config::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use crate::KeywardenError;
use rand::rngs::OsRng;
use rand::Rng;

/// The 36-symbol alphabet license codes are drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate license codes.
///
/// Generators make no uniqueness promise; the store rejects duplicates and
/// the manager retries.
pub trait CodeGenerator: Send + Sync {
    /// Produce a code of exactly `length` characters.
    fn generate(&self, length: usize) -> Result<String, KeywardenError>;
}

/// Draws codes uniformly from [`CODE_ALPHABET`] using the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self, length: usize) -> Result<String, KeywardenError> {
        validate_length(length)?;

        let mut rng = OsRng;
        let code = (0..length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Ok(code)
    }
}

/// Reject lengths outside `MIN_CODE_LENGTH..=MAX_CODE_LENGTH`.
///
/// Out-of-range lengths are an error rather than being clamped, so a caller
/// never receives a code shorter than requested.
pub fn validate_length(length: usize) -> Result<(), KeywardenError> {
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
        return Err(KeywardenError::InvalidParameter(format!(
            "code length must be between {} and {}, got {}",
            MIN_CODE_LENGTH, MAX_CODE_LENGTH, length
        )));
    }
    Ok(())
}
