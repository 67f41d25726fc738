//! Domain-separated context keys via HKDF-SHA256.
//!
//! Every purpose the client encrypts for gets its own subkey:
//! `HKDF-SHA256(salt = SHA-256(domain salt input), info = domain info,
//! ikm = vault key)`. Under the HKDF/HMAC assumption, keys from distinct
//! domains are computationally independent even though they share the vault
//! key as input - the server sees opaque blobs segmented by purpose without
//! ever holding material that links them.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::kdf::{VAULT_KEY_SIZE, VaultKey};

/// Salt input for the identity domain.
const IDENTITY_SALT_INPUT: &str = "hush-identity-salt";

/// Salt input for the contacts domain.
const CONTACTS_SALT_INPUT: &str = "hush-contacts-salt";

/// A purpose-bound subkey derived from the vault key.
///
/// Zeroized on drop; cached per unlocked session by
/// `hush-core`'s `VaultSession` and cleared on lock.
#[derive(Clone)]
pub struct ContextKey {
    bytes: [u8; VAULT_KEY_SIZE],
}

impl ContextKey {
    /// Raw key bytes, sized for AES-256-GCM.
    pub fn as_bytes(&self) -> &[u8; VAULT_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContextKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// The closed set of key derivation domains.
///
/// Each variant fixes an independent (salt input, info string) pair. The
/// enum is the only way to name a domain, so an unknown or ad-hoc domain
/// cannot be derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyDomain {
    /// The user's own identity record.
    Identity,
    /// The encrypted contact list.
    Contacts,
    /// A two-party conversation, keyed by the unordered participant pair.
    Conversation {
        /// One participant's identifier.
        a: String,
        /// The other participant's identifier.
        b: String,
    },
    /// Group metadata for a specific key epoch.
    Group {
        /// Group identifier.
        group_id: String,
        /// Key epoch the metadata belongs to.
        epoch: u64,
    },
    /// The per-member wrapping path for group epoch-key envelopes.
    ///
    /// Derivable by exactly the member it addresses (all members of a
    /// deployment share the vault key) and independent of every content
    /// domain.
    GroupEnvelope {
        /// Group identifier.
        group_id: String,
        /// Member the envelope is addressed to.
        member_id: String,
    },
}

impl KeyDomain {
    /// HKDF info string for this domain.
    pub fn info(&self) -> &'static [u8] {
        match self {
            Self::Identity => b"hush-identity",
            Self::Contacts => b"hush-contacts",
            Self::Conversation { .. } => b"hush-conversation",
            Self::Group { .. } => b"hush-group-conversation",
            Self::GroupEnvelope { .. } => b"hush-group-envelope",
        }
    }

    /// Deterministic salt input string for this domain.
    ///
    /// The conversation variant sorts its participants so both sides derive
    /// the same key regardless of argument order.
    pub fn salt_input(&self) -> String {
        match self {
            Self::Identity => IDENTITY_SALT_INPUT.to_string(),
            Self::Contacts => CONTACTS_SALT_INPUT.to_string(),
            Self::Conversation { a, b } => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                format!("{lo}:{hi}")
            },
            Self::Group { group_id, epoch } => format!("{group_id}:{epoch}"),
            Self::GroupEnvelope { group_id, member_id } => format!("{group_id}:{member_id}"),
        }
    }
}

/// Derive the context key for a domain from the vault key.
///
/// Deterministic: the same vault key and domain always produce the same
/// subkey, so context keys never need to be stored - only re-derived.
pub fn derive_context_key(vault_key: &VaultKey, domain: &KeyDomain) -> ContextKey {
    let salt = Sha256::digest(domain.salt_input().as_bytes());
    let hkdf = Hkdf::<Sha256>::new(Some(salt.as_slice()), vault_key.as_bytes());

    let mut okm = [0u8; VAULT_KEY_SIZE];
    let Ok(()) = hkdf.expand(domain.info(), &mut okm) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    ContextKey { bytes: okm }
}
