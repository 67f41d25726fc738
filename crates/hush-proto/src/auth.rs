//! Authentication exchange wire shapes.
//!
//! The client never sends its words: it submits `SHA-256(normalize(words))`
//! and receives the deployment KDF salt alongside a bearer token. A blocked
//! IP receives a generic notice that leaks neither credential correctness
//! nor a remaining-attempt count.

use serde::{Deserialize, Serialize};

/// Client credential submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// base64(SHA-256(normalized passphrase)).
    pub auth_hash: String,
}

/// Successful authentication response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    /// Fixed-TTL bearer session token.
    pub token: String,
    /// Base64 deployment salt for client-side vault key derivation.
    pub kdf_salt: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Failed authentication response for an unblocked IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDenied {
    /// Stable error code, `invalid_credentials`.
    pub error: String,
    /// Attempts left before the configured failure policy triggers.
    pub remaining_attempts: u32,
}

impl AuthDenied {
    /// The canonical denial with the given remaining budget.
    pub fn new(remaining_attempts: u32) -> Self {
        Self { error: "invalid_credentials".to_string(), remaining_attempts }
    }
}

/// Response for a blocked IP. Carries no attempt count and is identical
/// whether or not the submitted credential was correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedNotice {
    /// Stable error code, `ip_blocked`.
    pub error: String,
    /// Human-readable denial, deliberately uninformative.
    pub message: String,
}

impl BlockedNotice {
    /// The canonical blocked response.
    pub fn new() -> Self {
        Self { error: "ip_blocked".to_string(), message: "Access denied".to_string() }
    }
}

impl Default for BlockedNotice {
    fn default() -> Self {
        Self::new()
    }
}
