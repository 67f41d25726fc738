//! Base64 wire form of encrypted blobs.
//!
//! Every encrypted payload travels as a `{ciphertext, iv}` pair of base64
//! strings. Decoding is strict: canonical padding, no stray characters, an
//! IV of exactly 12 decoded bytes, and a decoded-size cap chosen by the
//! payload class. Violations are rejected here, before the ciphertext can
//! reach storage or the crypto layer.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hush_crypto::{EncryptedBlob, IV_SIZE, PIN_SALT_SIZE, PinEnvelope};
use serde::{Deserialize, Serialize};

use crate::{
    error::WireError,
    limits::{MAX_MESSAGE_CIPHERTEXT_BYTES, MAX_METADATA_CIPHERTEXT_BYTES, base64_max_len},
};

/// Which size cap applies to a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobClass {
    /// Message bodies: 64 KiB decoded.
    Message,
    /// Conversation/group metadata: 16 KiB decoded.
    Metadata,
}

impl BlobClass {
    /// The decoded-size cap for this class.
    pub fn max_bytes(self) -> usize {
        match self {
            Self::Message => MAX_MESSAGE_CIPHERTEXT_BYTES,
            Self::Metadata => MAX_METADATA_CIPHERTEXT_BYTES,
        }
    }
}

/// An encrypted blob in transit: base64 ciphertext and base64 IV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBlob {
    /// Base64-encoded ciphertext (including the GCM tag).
    pub ciphertext: String,
    /// Base64-encoded 12-byte IV.
    pub iv: String,
}

impl WireBlob {
    /// Encode a blob for transport.
    pub fn encode(blob: &EncryptedBlob) -> Self {
        Self { ciphertext: BASE64.encode(&blob.ciphertext), iv: BASE64.encode(blob.iv) }
    }

    /// Decode and validate against the class cap.
    ///
    /// # Errors
    ///
    /// [`WireError::TooLarge`] (checked against the padded-base64 bound
    /// before decoding, and against the cap after),
    /// [`WireError::InvalidBase64`], or [`WireError::InvalidLength`].
    pub fn decode(&self, class: BlobClass) -> Result<EncryptedBlob, WireError> {
        let max_bytes = class.max_bytes();

        if self.ciphertext.len() > base64_max_len(max_bytes) {
            return Err(WireError::TooLarge { field: "ciphertext", max_bytes });
        }

        let ciphertext = BASE64
            .decode(&self.ciphertext)
            .map_err(|_| WireError::InvalidBase64 { field: "ciphertext" })?;

        if ciphertext.len() > max_bytes {
            return Err(WireError::TooLarge { field: "ciphertext", max_bytes });
        }

        let iv = decode_exact::<IV_SIZE>(&self.iv, "iv")?;

        Ok(EncryptedBlob { ciphertext, iv })
    }
}

/// Persisted wire form of a PIN envelope (local collaborator store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePinEnvelope {
    /// Base64-encoded local KDF salt.
    pub salt: String,
    /// The wrapped vault key.
    #[serde(flatten)]
    pub blob: WireBlob,
}

impl WirePinEnvelope {
    /// Encode an envelope for persistence.
    pub fn encode(envelope: &PinEnvelope) -> Self {
        Self { salt: BASE64.encode(envelope.salt()), blob: WireBlob::encode(envelope.blob()) }
    }

    /// Decode and validate a persisted envelope.
    ///
    /// The wrapped key is a fixed-size secret, so the metadata cap applies.
    pub fn decode(&self) -> Result<PinEnvelope, WireError> {
        let salt = decode_exact::<PIN_SALT_SIZE>(&self.salt, "salt")?;
        let blob = self.blob.decode(BlobClass::Metadata)?;

        Ok(PinEnvelope::from_parts(salt, blob))
    }
}

/// Decode a base64 field that must produce exactly `N` bytes.
fn decode_exact<const N: usize>(encoded: &str, field: &'static str) -> Result<[u8; N], WireError> {
    // Pre-decode bound keeps pathological inputs from allocating
    if encoded.len() > base64_max_len(N) {
        return Err(WireError::InvalidLength { field, expected: N, got: encoded.len() / 4 * 3 });
    }

    let decoded = BASE64.decode(encoded).map_err(|_| WireError::InvalidBase64 { field })?;

    let got = decoded.len();
    decoded
        .try_into()
        .map_err(|_| WireError::InvalidLength { field, expected: N, got })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blob(len: usize) -> EncryptedBlob {
        EncryptedBlob { ciphertext: vec![0xC7; len], iv: [9u8; IV_SIZE] }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let blob = sample_blob(128);
        let wire = WireBlob::encode(&blob);
        assert_eq!(wire.decode(BlobClass::Message).unwrap(), blob);
    }

    #[test]
    fn invalid_base64_ciphertext_is_rejected() {
        let wire = WireBlob { ciphertext: "not!!base64".into(), iv: BASE64.encode([0u8; 12]) };
        assert_eq!(
            wire.decode(BlobClass::Message),
            Err(WireError::InvalidBase64 { field: "ciphertext" })
        );
    }

    #[test]
    fn whitespace_in_base64_is_rejected() {
        let mut wire = WireBlob::encode(&sample_blob(32));
        wire.ciphertext.insert(4, '\n');
        assert!(matches!(
            wire.decode(BlobClass::Message),
            Err(WireError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn iv_must_be_exactly_twelve_bytes() {
        let short = WireBlob { ciphertext: BASE64.encode([1u8; 8]), iv: BASE64.encode([0u8; 8]) };
        assert_eq!(
            short.decode(BlobClass::Message),
            Err(WireError::InvalidLength { field: "iv", expected: 12, got: 8 })
        );

        let long = WireBlob { ciphertext: BASE64.encode([1u8; 8]), iv: BASE64.encode([0u8; 13]) };
        assert!(matches!(
            long.decode(BlobClass::Message),
            Err(WireError::InvalidLength { .. })
        ));
    }

    #[test]
    fn message_cap_is_enforced() {
        let wire = WireBlob::encode(&sample_blob(MAX_MESSAGE_CIPHERTEXT_BYTES + 1));
        assert_eq!(
            wire.decode(BlobClass::Message),
            Err(WireError::TooLarge { field: "ciphertext", max_bytes: MAX_MESSAGE_CIPHERTEXT_BYTES })
        );
    }

    #[test]
    fn metadata_cap_is_tighter_than_message_cap() {
        let blob = sample_blob(MAX_METADATA_CIPHERTEXT_BYTES + 1);
        let wire = WireBlob::encode(&blob);

        assert!(wire.decode(BlobClass::Message).is_ok());
        assert_eq!(
            wire.decode(BlobClass::Metadata),
            Err(WireError::TooLarge {
                field: "ciphertext",
                max_bytes: MAX_METADATA_CIPHERTEXT_BYTES
            })
        );
    }

    #[test]
    fn cap_check_runs_before_decode() {
        // A ciphertext field longer than the padded bound must be rejected
        // even though it is not valid base64 at all.
        let oversized = "!".repeat(base64_max_len(MAX_MESSAGE_CIPHERTEXT_BYTES) + 4);
        let wire = WireBlob { ciphertext: oversized, iv: BASE64.encode([0u8; 12]) };
        assert!(matches!(
            wire.decode(BlobClass::Message),
            Err(WireError::TooLarge { .. })
        ));
    }

    #[test]
    fn exact_cap_is_accepted() {
        let wire = WireBlob::encode(&sample_blob(MAX_METADATA_CIPHERTEXT_BYTES));
        assert!(wire.decode(BlobClass::Metadata).is_ok());
    }

    #[test]
    fn pin_envelope_wire_roundtrip() {
        let vault_key = hush_crypto::VaultKey::from_bytes([3u8; 32]);
        let envelope = PinEnvelope::seal(&vault_key, "1234").unwrap();

        let wire = WirePinEnvelope::encode(&envelope);
        let decoded = wire.decode().unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(decoded.unseal("1234").unwrap().as_bytes(), vault_key.as_bytes());
    }

    #[test]
    fn pin_envelope_salt_length_is_validated() {
        let wire = WirePinEnvelope {
            salt: BASE64.encode([0u8; 4]),
            blob: WireBlob::encode(&sample_blob(48)),
        };
        assert!(matches!(wire.decode(), Err(WireError::InvalidLength { .. })));
    }

    #[test]
    fn wire_blob_serde_shape() {
        let wire = WireBlob::encode(&sample_blob(3));
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("ciphertext").is_some());
        assert!(json.get("iv").is_some());
        assert_eq!(json.as_object().map(serde_json::Map::len), Some(2));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn roundtrip_for_arbitrary_blobs(
                ciphertext in proptest::collection::vec(any::<u8>(), 0..512),
                iv in any::<[u8; IV_SIZE]>(),
            ) {
                let blob = EncryptedBlob { ciphertext, iv };
                let wire = WireBlob::encode(&blob);
                prop_assert_eq!(wire.decode(BlobClass::Metadata).unwrap(), blob);
            }
        }
    }
}
