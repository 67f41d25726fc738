//! Authenticated encryption: AES-256-GCM with fresh-IV discipline.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};

use crate::{error::CryptoError, kdf::VAULT_KEY_SIZE};

/// Fixed IV length for AES-GCM, in bytes.
pub const IV_SIZE: usize = 12;

/// A ciphertext and the IV it was produced under.
///
/// Always travels as a pair; the wire form (base64 of both fields) lives in
/// `hush-proto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// AES-256-GCM ciphertext including the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
    /// The 12-byte IV used for this encryption.
    pub iv: [u8; IV_SIZE],
}

/// Encrypt a plaintext under a 32-byte key.
///
/// A fresh random 12-byte IV is drawn from the OS CSPRNG on every call -
/// IVs are never reused for a given key. Plaintext size is unbounded here;
/// the transport boundary enforces caps before blobs reach storage.
pub fn encrypt(key: &[u8; VAULT_KEY_SIZE], plaintext: &[u8]) -> EncryptedBlob {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new(key.into());
    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&iv), plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail with valid inputs");
    };

    EncryptedBlob { ciphertext, iv }
}

/// Decrypt a blob under a 32-byte key.
///
/// # Errors
///
/// Always [`CryptoError::DecryptionFailed`], whatever went wrong - wrong
/// key, tampered ciphertext, or corrupted IV. The caller must not be able
/// to distinguish the cases.
pub fn decrypt(key: &[u8; VAULT_KEY_SIZE], blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.into());

    cipher
        .decrypt(Nonce::from_slice(&blob.iv), blob.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)
}
