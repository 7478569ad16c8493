//! RSA-PSS signing of license codes.
//!
//! Signatures use PSS padding with MGF1-SHA-256, a SHA-256 message digest
//! and the largest salt the modulus allows, so two signatures over the same
//! code differ.

use crate::KeywardenError;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey};
use sha2::{Digest, Sha256};

/// Largest PSS salt for a key with a `modulus_bits`-bit modulus.
///
/// `emLen - hLen - 2` with `emLen = ceil((modBits - 1) / 8)`, which is one
/// byte short of the modulus size when the bit length is `8k + 1`.
pub fn max_salt_len(modulus_bits: usize) -> usize {
    let em_len = (modulus_bits.saturating_sub(1) + 7) / 8;
    em_len.saturating_sub(Sha256::output_size() + 2)
}

/// Sign `message` with the private key.
///
/// # Errors
/// * `Signing` - The key is too small for PSS with SHA-256, or the RSA
///   operation failed.
pub fn sign_code(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, KeywardenError> {
    let salt_len = max_salt_len(private_key.n().bits());
    if salt_len == 0 {
        return Err(KeywardenError::Signing(format!(
            "{}-bit modulus is too small for PSS/SHA-256",
            private_key.n().bits()
        )));
    }

    let hashed = Sha256::digest(message);
    private_key
        .sign_with_rng(&mut OsRng, Pss::new_with_salt::<Sha256>(salt_len), &hashed)
        .map_err(|e| KeywardenError::Signing(e.to_string()))
}
