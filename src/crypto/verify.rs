//! RSA-PSS signature verification.

use crate::crypto::signing::max_salt_len;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Verify a PSS signature over `message`.
///
/// Returns `false` for any mismatch: altered message, wrong key, corrupted
/// or wrongly sized signature bytes. A mismatch is an expected outcome, not
/// an error.
pub fn verify_signature(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    if signature.len() != public_key.size() {
        return false;
    }

    let hashed = Sha256::digest(message);
    let scheme = Pss::new_with_salt::<Sha256>(max_salt_len(public_key.n().bits()));
    public_key.verify(scheme, &hashed, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signing::sign_code;
    use crate::keys::test_key_pair;

    const CODE: &[u8] = b"A1B2C3D4E5F6G7H8";

    #[test]
    fn test_verify_valid_signature() {
        let keys = test_key_pair();
        let signature = sign_code(keys.private_key(), CODE).unwrap();
        assert!(verify_signature(keys.public_key(), CODE, &signature));
    }

    #[test]
    fn test_verify_rejects_altered_message() {
        let keys = test_key_pair();
        let signature = sign_code(keys.private_key(), CODE).unwrap();
        assert!(!verify_signature(
            keys.public_key(),
            b"A1B2C3D4E5F6G7H9",
            &signature
        ));
    }

    #[test]
    fn test_verify_rejects_every_single_byte_flip() {
        let keys = test_key_pair();
        let signature = sign_code(keys.private_key(), CODE).unwrap();

        // Spot-check positions across the signature, including both ends
        for index in [0, 1, 64, 127, 128, 200, signature.len() - 1] {
            let mut tampered = signature.clone();
            tampered[index] ^= 0x01;
            assert!(
                !verify_signature(keys.public_key(), CODE, &tampered),
                "flip at byte {} verified",
                index
            );
        }
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        let keys = test_key_pair();
        let signature = sign_code(keys.private_key(), CODE).unwrap();
        assert!(!verify_signature(keys.public_key(), CODE, &signature[1..]));
        assert!(!verify_signature(keys.public_key(), CODE, &[]));
    }

    #[test]
    fn test_verify_rejects_zero_signature() {
        let keys = test_key_pair();
        let zeros = vec![0u8; keys.public_key().size()];
        assert!(!verify_signature(keys.public_key(), CODE, &zeros));
    }
}
