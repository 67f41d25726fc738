//! Hush Cryptographic Primitives
//!
//! Cryptographic building blocks for the Hush vault. Pure functions with
//! deterministic outputs wherever the protocol demands determinism; the only
//! internal randomness is fresh-IV generation in the AEAD layer.
//!
//! # Key Hierarchy
//!
//! Every key in the system descends from a single vault key derived from the
//! deployment's 12-word passphrase. HKDF with domain-separated salts and info
//! strings fans the vault key out into purpose-bound subkeys; the server only
//! ever sees ciphertext produced under those subkeys.
//!
//! ```text
//! 12-word passphrase + deployment salt
//!        │
//!        ▼
//! Argon2id → Vault Key (32 bytes, volatile)
//!        │
//!        ▼
//! HKDF-SHA256 → Context Keys (identity, contacts, conversation,
//!        │                    group, group-envelope)
//!        ▼
//! AES-256-GCM → Ciphertext blobs (the only thing the server stores)
//! ```
//!
//! # Security
//!
//! Determinism:
//! - Same passphrase and salt always derive the same vault key
//! - Same vault key and domain always derive the same context key
//! - Conversation identifiers are commutative in their two participants
//!
//! Domain separation:
//! - Each context key uses an independent HKDF salt and info string
//! - Compromising one context key reveals nothing about another, nor about
//!   the vault key itself
//!
//! Failure opacity:
//! - Decryption failure is a single, cause-free error regardless of whether
//!   the key was wrong, the ciphertext was tampered with, or the IV was
//!   corrupted
//!
//! Memory hygiene:
//! - All key types zeroize their bytes on drop and redact `Debug` output

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod context;
pub mod conversation;
mod error;
pub mod kdf;
pub mod passphrase;
pub mod pin;

pub use aead::{EncryptedBlob, IV_SIZE, decrypt, encrypt};
pub use context::{ContextKey, KeyDomain, derive_context_key};
pub use conversation::conversation_id;
pub use error::CryptoError;
pub use kdf::{KDF_SALT_SIZE, VAULT_KEY_SIZE, VaultKey, decode_kdf_salt, derive_vault_key};
pub use passphrase::{PASSPHRASE_WORDS, generate_kdf_salt, generate_words, hash_words, normalize_words};
pub use pin::{PIN_SALT_SIZE, PinEnvelope};
