//! Textual encoding of signatures for storage.

use crate::KeywardenError;

/// Encode raw signature bytes as lowercase hex.
pub fn encode_signature(signature: &[u8]) -> String {
    hex::encode(signature)
}

/// Decode a hex-encoded signature.
///
/// # Errors
/// * `Encoding` - The text is empty, has odd length, or contains non-hex
///   characters.
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>, KeywardenError> {
    if encoded.is_empty() {
        return Err(KeywardenError::Encoding("empty signature".to_string()));
    }
    hex::decode(encoded).map_err(|e| KeywardenError::Encoding(e.to_string()))
}
