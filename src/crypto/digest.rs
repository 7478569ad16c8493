//! SHA-256 fingerprints for identifying keys without exposing them.

use crate::KeywardenError;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of arbitrary bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Fingerprint of a public key: SHA-256 over its SubjectPublicKeyInfo DER.
///
/// Safe to log and print. Two parties holding the same public key compute
/// the same fingerprint.
pub fn public_key_fingerprint(public_key: &RsaPublicKey) -> Result<String, KeywardenError> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| KeywardenError::KeyCorrupt(format!("Failed to encode public key: {}", e)))?;
    Ok(sha256_hex(der.as_bytes()))
}
