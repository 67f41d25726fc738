//! The unlocked vault session and its context-key cache.

use std::collections::HashMap;

use hush_crypto::{
    ContextKey, CryptoError, KeyDomain, PinEnvelope, VaultKey, derive_context_key,
    derive_vault_key,
};

/// An unlocked vault: the vault key plus lazily derived context keys.
///
/// Owned by the caller and passed by reference into every crypto operation;
/// there is deliberately no global session. Exactly one `VaultSession`
/// exists per unlocked vault. Derivation mutates the cache (single writer),
/// reads hand out borrowed keys, and [`lock`](Self::lock) consumes the
/// session so no read can observe a half-cleared cache.
pub struct VaultSession {
    vault_key: VaultKey,
    context_keys: HashMap<KeyDomain, ContextKey>,
}

impl VaultSession {
    /// Unlock with the 12-word passphrase and deployment salt.
    ///
    /// # Errors
    ///
    /// Propagates [`CryptoError`] from vault key derivation.
    pub fn unlock(words: &str, salt: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self::from_vault_key(derive_vault_key(words, salt)?))
    }

    /// Unlock from a PIN envelope (fast local re-unlock path).
    ///
    /// # Errors
    ///
    /// A single generic [`CryptoError::DecryptionFailed`] for a wrong PIN
    /// or corrupted envelope.
    pub fn unlock_with_pin(envelope: &PinEnvelope, pin: &str) -> Result<Self, CryptoError> {
        Ok(Self::from_vault_key(envelope.unseal(pin)?))
    }

    /// Wrap an already-derived vault key (e.g. right after deployment).
    pub fn from_vault_key(vault_key: VaultKey) -> Self {
        Self { vault_key, context_keys: HashMap::new() }
    }

    /// Derive (or fetch from cache) the context key for a domain.
    pub fn context_key(&mut self, domain: KeyDomain) -> &ContextKey {
        let vault_key = &self.vault_key;
        self.context_keys.entry(domain).or_insert_with_key(|d| derive_context_key(vault_key, d))
    }

    /// Context key for a two-party conversation (commutative in the pair).
    pub fn conversation_key(&mut self, a: &str, b: &str) -> &ContextKey {
        self.context_key(KeyDomain::Conversation { a: a.to_string(), b: b.to_string() })
    }

    /// Context key for group metadata at a specific epoch.
    pub fn group_metadata_key(&mut self, group_id: &str, epoch: u64) -> &ContextKey {
        self.context_key(KeyDomain::Group { group_id: group_id.to_string(), epoch })
    }

    /// Per-member wrapping key for group epoch-key envelopes.
    pub fn member_envelope_key(&mut self, group_id: &str, member_id: &str) -> &ContextKey {
        self.context_key(KeyDomain::GroupEnvelope {
            group_id: group_id.to_string(),
            member_id: member_id.to_string(),
        })
    }

    /// Seal the vault key under a PIN for fast re-unlock.
    ///
    /// # Errors
    ///
    /// Propagates [`CryptoError`] from PIN key derivation.
    pub fn seal_pin_envelope(&self, pin: &str) -> Result<PinEnvelope, CryptoError> {
        PinEnvelope::seal(&self.vault_key, pin)
    }

    /// Number of context keys currently cached.
    pub fn cached_key_count(&self) -> usize {
        self.context_keys.len()
    }

    /// Lock the vault.
    ///
    /// Consumes the session: the vault key and every cached context key are
    /// zeroized (via their `Drop` impls) before this returns, and the type
    /// system guarantees no later read can touch the dead cache.
    pub fn lock(self) {
        drop(self);
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("vault_key", &"[REDACTED]")
            .field("cached_keys", &self.context_keys.len())
            .finish()
    }
}
