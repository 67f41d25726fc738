//! PIN envelope: fast local re-unlock without the 12-word passphrase.
//!
//! The raw vault-key bytes are AEAD-wrapped under a key derived from a
//! low-entropy PIN and a local random salt. An incorrect PIN fails closed
//! via the GCM authentication tag - never a silent wrong-plaintext result.
//! Because PIN entropy is far below passphrase entropy, callers must gate
//! unseal attempts through `hush-core`'s PIN attempt guard.

use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroize;

use crate::{
    aead::{self, EncryptedBlob},
    error::CryptoError,
    kdf::{self, VAULT_KEY_SIZE, VaultKey},
};

/// Size of the local PIN salt in bytes.
pub const PIN_SALT_SIZE: usize = 16;

/// A locally persisted wrapping of the vault key under a PIN-derived key.
///
/// Persisted only by the local collaborator store; deleting it disables the
/// PIN path without affecting passphrase unlock. The KDF parameters are the
/// same fixed Argon2id set as vault derivation, so a stolen envelope costs
/// an attacker a full memory-hard derivation per PIN guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEnvelope {
    salt: [u8; PIN_SALT_SIZE],
    blob: EncryptedBlob,
}

impl PinEnvelope {
    /// Wrap the vault key under a new PIN with a fresh local salt.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if the PIN wrapping key cannot
    /// be derived.
    pub fn seal(vault_key: &VaultKey, pin: &str) -> Result<Self, CryptoError> {
        let mut salt = [0u8; PIN_SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let mut wrapping_key = derive_pin_key(pin, &salt)?;
        let blob = aead::encrypt(&wrapping_key, vault_key.as_bytes());
        wrapping_key.zeroize();

        Ok(Self { salt, blob })
    }

    /// Recover the vault key by re-deriving the wrapping key from the PIN.
    ///
    /// # Errors
    ///
    /// [`CryptoError::DecryptionFailed`] for an incorrect PIN or a corrupted
    /// envelope - the two are indistinguishable by design.
    pub fn unseal(&self, pin: &str) -> Result<VaultKey, CryptoError> {
        let mut wrapping_key = derive_pin_key(pin, &self.salt)?;
        let result = aead::decrypt(&wrapping_key, &self.blob);
        wrapping_key.zeroize();

        let mut plaintext = result?;

        if plaintext.len() != VAULT_KEY_SIZE {
            plaintext.zeroize();
            return Err(CryptoError::DecryptionFailed);
        }

        let mut bytes = [0u8; VAULT_KEY_SIZE];
        bytes.copy_from_slice(&plaintext);
        plaintext.zeroize();

        Ok(VaultKey::from_bytes(bytes))
    }

    /// Check a PIN without exposing the vault key.
    ///
    /// Backs the disable flow: the collaborator store deletes the envelope
    /// only after a successful verification here.
    pub fn verify(&self, pin: &str) -> Result<(), CryptoError> {
        self.unseal(pin).map(drop)
    }

    /// Re-wrap under a new PIN, requiring the old PIN to succeed first.
    ///
    /// The new envelope uses a freshly derived key over a fresh salt.
    pub fn change_pin(&self, old_pin: &str, new_pin: &str) -> Result<Self, CryptoError> {
        let vault_key = self.unseal(old_pin)?;
        Self::seal(&vault_key, new_pin)
    }

    /// Reassemble an envelope from its persisted parts.
    pub fn from_parts(salt: [u8; PIN_SALT_SIZE], blob: EncryptedBlob) -> Self {
        Self { salt, blob }
    }

    /// The local salt, for persistence.
    pub fn salt(&self) -> &[u8; PIN_SALT_SIZE] {
        &self.salt
    }

    /// The wrapped key blob, for persistence.
    pub fn blob(&self) -> &EncryptedBlob {
        &self.blob
    }
}

/// Derive the PIN wrapping key with the fixed Argon2id parameters.
fn derive_pin_key(pin: &str, salt: &[u8; PIN_SALT_SIZE]) -> Result<[u8; VAULT_KEY_SIZE], CryptoError> {
    kdf::derive_raw(pin.as_bytes(), salt)
}
