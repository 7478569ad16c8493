//! # Keywarden
//!
//! **Signed license issuance, verification and revocation for Rust.**
//!
//! Keywarden issues license codes, signs each one with an RSA private key
//! (PSS padding, SHA-256, maximal salt) and records it in a SQLite store.
//! Verification looks the code up, checks revocation and expiry, and then
//! checks the signature against the public key.
//!
//! ## Features
//!
//! - **Unpredictable codes**: drawn from `A-Z0-9` with the OS random source
//! - **RSA-PSS signatures**: randomized, so equal codes never share a signature
//! - **Expiry and revocation**: validity is computed on every check, never cached
//! - **Unique codes**: enforced by the store, collisions retried with a fresh code
//! - **Structured outcomes**: a rejected license is a [`ValidationReason`], not an error
//!
//! ## Quickstart
//!
//! ```no_run
//! use keywarden::{initialize, KeywardenConfig, LicenseManager};
//!
//! fn main() -> Result<(), keywarden::KeywardenError> {
//!     let config = KeywardenConfig::in_dir("/var/lib/keywarden");
//!     initialize(&config, false)?; // once: keys + schema
//!
//!     let manager = LicenseManager::new(config)?;
//!     let issued = manager.issue(16, 30)?;
//!
//!     let result = manager.verify(&issued.code)?;
//!     if result.valid {
//!         println!("{} valid until {}", issued.code, issued.expires_at);
//!     }
//!
//!     manager.revoke(&issued.code)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Keywarden protects against:
//! - **Forged codes**: a code not signed by the private key fails verification
//! - **Store tampering**: altered codes or signatures report `TamperedOrInvalid`
//! - **Code guessing**: 16 symbols of a 36-symbol alphabet is about 82 bits
//!
//! The private key is stored as unencrypted PKCS#8 PEM. Anyone who can read
//! that file can issue licenses. Keep it on the issuing host only and
//! restrict its permissions (Keywarden creates it with mode `0600`).

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;
pub mod keys;

// Code generation
pub mod codegen;

// Storage layer
pub mod store;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use codegen::{CodeGenerator, SecureCodeGenerator};
pub use config::KeywardenConfig;
pub use errors::KeywardenError;
pub use keys::{file::PemFileKeyProvider, KeyPair, KeyPairProvider};
pub use manager::{initialize, IssuedLicense, LicenseManager, ValidationReason, ValidationResult};
pub use store::{sqlite::SqliteLicenseStore, License, LicenseStatus, LicenseStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
