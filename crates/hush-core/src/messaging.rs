//! Payload encryption: the client data path.
//!
//! Serializes a typed payload, encrypts it under a context or epoch key,
//! and on the way back validates the decrypted bytes against the closed
//! payload union plus the transport routing before anything downstream may
//! trust them.

use hush_crypto::{EncryptedBlob, VAULT_KEY_SIZE, aead};
use hush_proto::{PayloadKind, PlaintextPayload, decode_payload};

use crate::error::CoreError;

/// Serialize and encrypt a payload under a 32-byte key.
pub fn encrypt_payload(key: &[u8; VAULT_KEY_SIZE], payload: &PlaintextPayload) -> EncryptedBlob {
    let Ok(plaintext) = serde_json::to_vec(payload) else {
        unreachable!("payload union serialization cannot fail");
    };

    aead::encrypt(key, &plaintext)
}

/// Decrypt a blob and validate it as exactly the expected payload kind.
///
/// # Errors
///
/// The generic [`hush_crypto::CryptoError::DecryptionFailed`] for any
/// crypto failure, or a [`hush_proto::WireError`] when the plaintext is not
/// a known shape or its embedded kind disagrees with the route it arrived
/// on.
pub fn decrypt_payload(
    key: &[u8; VAULT_KEY_SIZE],
    blob: &EncryptedBlob,
    expected: PayloadKind,
) -> Result<PlaintextPayload, CoreError> {
    let plaintext = aead::decrypt(key, blob)?;
    Ok(decode_payload(&plaintext, expected)?)
}
