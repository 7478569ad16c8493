//! Signing key pair and the providers that persist it.

pub mod file;

use crate::KeywardenError;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;

/// RSA key pair used to sign and verify license codes.
///
/// The private key never appears in `Debug` output.
#[derive(Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate(bits: usize) -> Result<Self, KeywardenError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| KeywardenError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Build a key pair from a private key, deriving the public half.
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Build a key pair from separately loaded halves.
    ///
    /// # Errors
    /// * `KeyCorrupt` - The public key does not belong to the private key.
    pub fn from_parts(
        private_key: RsaPrivateKey,
        public_key: RsaPublicKey,
    ) -> Result<Self, KeywardenError> {
        if private_key.to_public_key() != public_key {
            return Err(KeywardenError::KeyCorrupt(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// The signing half.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// The verification half.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.n().bits()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Source of the issuing authority's key pair.
///
/// Injected into [`LicenseManager`](crate::LicenseManager) so business logic
/// never reads key files on its own.
pub trait KeyPairProvider {
    /// Create and persist a new key pair, replacing any existing one.
    fn generate_key_pair(&self) -> Result<KeyPair, KeywardenError>;

    /// Load the persisted key pair. Never generates.
    fn load_key_pair(&self) -> Result<KeyPair, KeywardenError>;
}

#[cfg(test)]
static TEST_KEYS: once_cell::sync::Lazy<KeyPair> =
    once_cell::sync::Lazy::new(|| KeyPair::generate(2048).expect("test key generation"));

#[cfg(test)]
static OTHER_TEST_KEYS: once_cell::sync::Lazy<KeyPair> =
    once_cell::sync::Lazy::new(|| KeyPair::generate(2048).expect("test key generation"));

/// Key pair shared by unit tests. RSA generation is slow, so do it once.
#[cfg(test)]
pub(crate) fn test_key_pair() -> &'static KeyPair {
    &TEST_KEYS
}

/// A second, unrelated key pair for wrong-key tests.
#[cfg(test)]
pub(crate) fn other_test_key_pair() -> &'static KeyPair {
    &OTHER_TEST_KEYS
}
