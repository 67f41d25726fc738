//! Error type for cryptographic operations.

use thiserror::Error;

/// Errors that can occur in the crypto layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Decryption failed.
    ///
    /// Deliberately carries no cause: a wrong key, a tampered ciphertext,
    /// and a corrupted IV must be indistinguishable to the caller, otherwise
    /// the error channel becomes a decryption oracle.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Key derivation rejected its inputs (e.g. a salt shorter than the
    /// Argon2 minimum).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A base64-encoded input (deployment salt, wire field) did not decode.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}
