//! Cryptographic primitives for license signatures.

pub mod digest;
pub mod encoding;
pub mod signing;
pub mod verify;
