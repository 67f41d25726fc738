//! Passphrase normalization, hashing, and deployment secret generation.
//!
//! The exact same normalization runs on both sides of the authentication
//! boundary: the client hashes its normalized words before submitting, and
//! the server compares against a hash of the same transform. Any divergence
//! silently breaks both authentication and decryption, so this module is the
//! single source of truth for the transform.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bip39::Mnemonic;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of words in a vault passphrase.
pub const PASSPHRASE_WORDS: usize = 12;

/// Size in bytes of a freshly generated deployment KDF salt.
const GENERATED_SALT_SIZE: usize = 32;

/// Canonicalize a passphrase into a byte-stable form.
///
/// Lowercases, collapses all whitespace runs, drops empty tokens, and joins
/// with single spaces. Idempotent: `normalize_words(normalize_words(x)) ==
/// normalize_words(x)`.
pub fn normalize_words(words: &str) -> String {
    words
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hash a passphrase for the authentication exchange.
///
/// Returns base64(SHA-256(normalized words)) - the value the client submits
/// and the server stores. This hash authenticates; it never derives keys
/// (that is Argon2id's job, see [`crate::kdf`]).
pub fn hash_words(words: &str) -> String {
    let normalized = normalize_words(words);
    let digest = Sha256::digest(normalized.as_bytes());
    BASE64.encode(digest)
}

/// Generate a fresh 12-word passphrase from the BIP39 English wordlist.
///
/// Used once at deployment time. The words are displayed to the operator and
/// never stored; losing them means permanent data loss.
pub fn generate_words(rng: &mut impl RngCore) -> String {
    let mut entropy = [0u8; 16];
    rng.fill_bytes(&mut entropy);

    let Ok(mnemonic) = Mnemonic::from_entropy(&entropy) else {
        unreachable!("16 bytes of entropy is a valid BIP39 length");
    };

    mnemonic.to_string()
}

/// Generate a fresh deployment KDF salt, base64-encoded for transport.
///
/// The salt is deployment-wide and non-secret; it is sent to every client so
/// that vault key derivation is reproducible across devices.
pub fn generate_kdf_salt(rng: &mut impl RngCore) -> String {
    let mut salt = [0u8; GENERATED_SALT_SIZE];
    rng.fill_bytes(&mut salt);
    BASE64.encode(salt)
}
