//! Shared fixtures for integration tests.

#![allow(dead_code)]

use keywarden::{KeyPair, KeywardenConfig, LicenseManager, PemFileKeyProvider};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// One RSA key per test binary; generation is slow.
static KEYS: Lazy<KeyPair> = Lazy::new(|| KeyPair::generate(2048).expect("test key generation"));

/// Returns the shared test key pair.
pub fn test_keys() -> &'static KeyPair {
    &KEYS
}

/// A license authority rooted in a temporary directory.
pub struct Authority {
    pub dir: TempDir,
    pub config: KeywardenConfig,
}

impl Authority {
    /// Writes the shared key pair into a fresh directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = KeywardenConfig::in_dir(dir.path());
        PemFileKeyProvider::from_config(&config)
            .store_key_pair(test_keys())
            .expect("store test keys");
        Self { dir, config }
    }

    /// Opens a manager over this authority's files, as a new process would.
    pub fn manager(&self) -> LicenseManager {
        LicenseManager::new(self.config.clone()).expect("open manager")
    }
}
