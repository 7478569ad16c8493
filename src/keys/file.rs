//! PEM key files with atomic writes.
//!
//! The private key is written as unencrypted PKCS#8 PEM and the public key
//! as SubjectPublicKeyInfo PEM. Writes go to a temp file that is renamed
//! into place. On Unix the private key file is created with mode `0600`.

use crate::config::KeywardenConfig;
use crate::crypto::digest::public_key_fingerprint;
use crate::keys::{KeyPair, KeyPairProvider};
use crate::KeywardenError;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Key pair provider backed by two PEM files.
#[derive(Debug, Clone)]
pub struct PemFileKeyProvider {
    private_key_path: PathBuf,
    public_key_path: PathBuf,
    key_bits: usize,
}

impl PemFileKeyProvider {
    /// Create a provider for the given paths.
    pub fn new(
        private_key_path: impl Into<PathBuf>,
        public_key_path: impl Into<PathBuf>,
        key_bits: usize,
    ) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
            key_bits,
        }
    }

    /// Create a provider for the paths in `config`.
    pub fn from_config(config: &KeywardenConfig) -> Self {
        Self::new(
            config.private_key_path.clone(),
            config.public_key_path.clone(),
            config.key_bits,
        )
    }

    /// Whether a private key file is already present.
    pub fn private_key_exists(&self) -> bool {
        self.private_key_path.exists()
    }

    /// Persist an existing key pair.
    pub fn store_key_pair(&self, keys: &KeyPair) -> Result<(), KeywardenError> {
        let private_pem = keys
            .private_key()
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeywardenError::KeyGeneration(format!("PKCS#8 encoding failed: {}", e)))?;
        let public_pem = keys
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeywardenError::KeyGeneration(format!("SPKI encoding failed: {}", e)))?;

        // Both files are staged before either is renamed, so a failed write
        // leaves the previous pair intact.
        let private_temp = write_temp(&self.private_key_path, private_pem.as_bytes(), true)
            .map_err(|e| write_error(&self.private_key_path, e))?;
        let public_temp = match write_temp(&self.public_key_path, public_pem.as_bytes(), false) {
            Ok(temp) => temp,
            Err(e) => {
                let _ = fs::remove_file(&private_temp);
                return Err(write_error(&self.public_key_path, e));
            }
        };

        fs::rename(&private_temp, &self.private_key_path)
            .map_err(|e| write_error(&self.private_key_path, e))?;
        fs::rename(&public_temp, &self.public_key_path)
            .map_err(|e| write_error(&self.public_key_path, e))?;

        warn!(
            path = %self.private_key_path.display(),
            "private key stored without encryption; restrict access to this file"
        );
        Ok(())
    }

    /// Load only the public key, for verification-only deployments.
    pub fn load_public_key(&self) -> Result<RsaPublicKey, KeywardenError> {
        let pem = read_key_file(&self.public_key_path)?;
        RsaPublicKey::from_public_key_pem(&pem).map_err(|e| {
            KeywardenError::KeyCorrupt(format!(
                "{} is not an SPKI public key: {}",
                self.public_key_path.display(),
                e
            ))
        })
    }

    fn load_private_key(&self) -> Result<RsaPrivateKey, KeywardenError> {
        let pem = read_key_file(&self.private_key_path)?;
        // The parse error is reported without echoing file contents.
        RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|e| {
            KeywardenError::KeyCorrupt(format!(
                "{} is not a PKCS#8 private key: {}",
                self.private_key_path.display(),
                e
            ))
        })
    }
}

impl KeyPairProvider for PemFileKeyProvider {
    fn generate_key_pair(&self) -> Result<KeyPair, KeywardenError> {
        info!(bits = self.key_bits, "generating license signing key pair");
        let keys = KeyPair::generate(self.key_bits)?;
        self.store_key_pair(&keys)?;

        if let Ok(fingerprint) = public_key_fingerprint(keys.public_key()) {
            info!(%fingerprint, "key pair generated");
        }
        Ok(keys)
    }

    fn load_key_pair(&self) -> Result<KeyPair, KeywardenError> {
        let private_key = self.load_private_key()?;
        let public_key = self.load_public_key()?;
        KeyPair::from_parts(private_key, public_key)
    }
}

fn read_key_file(path: &Path) -> Result<String, KeywardenError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => KeywardenError::KeyNotFound {
            path: path.to_path_buf(),
        },
        _ => KeywardenError::KeyCorrupt(format!("Failed to read {}: {}", path.display(), e)),
    })
}

fn write_error(path: &Path, e: io::Error) -> KeywardenError {
    KeywardenError::KeyGeneration(format!("Failed to write {}: {}", path.display(), e))
}

/// Write `contents` to a fresh `<path>.tmp` and return its path.
///
/// A leftover temp file is removed first so its permissions are never
/// inherited.
fn write_temp(path: &Path, contents: &[u8], owner_only: bool) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    match fs::remove_file(&temp_path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    if owner_only {
        restrict_to_owner(&mut options);
    }

    let mut file = options.open(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(temp_path)
}

#[cfg(unix)]
fn restrict_to_owner(options: &mut fs::OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn restrict_to_owner(_options: &mut fs::OpenOptions) {}
