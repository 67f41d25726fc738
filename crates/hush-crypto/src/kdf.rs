//! Vault key derivation: Argon2id over the normalized passphrase.
//!
//! The parameters below are fixed for the lifetime of a deployment. There is
//! no versioning and no migration path: changing any of them silently
//! invalidates every previously encrypted blob. Secrecy rests entirely in
//! the 12-word passphrase; the salt is deployment-wide and sent to clients.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use zeroize::Zeroize;

use crate::{error::CryptoError, passphrase::normalize_words};

/// Size of the vault key in bytes.
pub const VAULT_KEY_SIZE: usize = 32;

/// Minimum accepted deployment salt length in bytes (Argon2 lower bound).
pub const KDF_SALT_SIZE: usize = 8;

/// Argon2id memory cost: 64 MiB.
const ARGON2_MEM_KIB: u32 = 64 * 1024;

/// Argon2id time cost (iterations).
const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id lane count.
const ARGON2_PARALLELISM: u32 = 2;

/// The master symmetric key for an unlocked vault.
///
/// Exists only in volatile memory unless wrapped under a PIN envelope
/// ([`crate::pin::PinEnvelope`]). Zeroized on drop.
#[derive(Clone)]
pub struct VaultKey {
    bytes: [u8; VAULT_KEY_SIZE],
}

impl VaultKey {
    /// Construct a vault key from raw bytes (PIN unwrap path).
    pub fn from_bytes(bytes: [u8; VAULT_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; VAULT_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for VaultKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the vault key from a passphrase and the deployment salt.
///
/// The passphrase is normalized internally so both unlock paths (fresh
/// entry, stored form) agree byte-for-byte. Deterministic: identical inputs
/// always yield a byte-identical key.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the salt is shorter than the
/// Argon2 minimum.
pub fn derive_vault_key(words: &str, salt: &[u8]) -> Result<VaultKey, CryptoError> {
    let mut normalized = normalize_words(words);
    let result = derive_raw(normalized.as_bytes(), salt);
    normalized.zeroize();

    Ok(VaultKey::from_bytes(result?))
}

/// Decode a base64-encoded deployment salt as served by the auth endpoint.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] for malformed base64 and
/// [`CryptoError::KeyDerivation`] for a decoded salt below the minimum
/// length.
pub fn decode_kdf_salt(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let salt = BASE64
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidEncoding(format!("kdf salt: {e}")))?;

    if salt.len() < KDF_SALT_SIZE {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be at least {KDF_SALT_SIZE} bytes, got {}",
            salt.len()
        )));
    }

    Ok(salt)
}

/// Run Argon2id with the fixed deployment parameters.
pub(crate) fn derive_raw(secret: &[u8], salt: &[u8]) -> Result<[u8; VAULT_KEY_SIZE], CryptoError> {
    let params =
        Params::new(ARGON2_MEM_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, Some(VAULT_KEY_SIZE));
    let Ok(params) = params else {
        unreachable!("fixed Argon2id parameters are valid");
    };

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; VAULT_KEY_SIZE];
    argon2
        .hash_password_into(secret, salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(key)
}
