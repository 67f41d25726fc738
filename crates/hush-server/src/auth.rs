//! The authentication flow.
//!
//! Ordered exactly as the security model demands: rate limit first (cheap
//! volume bound), then the block check (before any credential work), then a
//! constant-time comparison of the submitted hash, and only then session
//! issuance or failure escalation. The blocked response carries no attempt
//! count and does not depend on whether the submitted credential was
//! correct.

use hush_core::Environment;
use hush_proto::{AuthDenied, AuthSuccess, BlockedNotice};
use subtle::ConstantTimeEq;

use crate::{
    config::ServerConfig,
    defense::{BlockStatus, DefenseMachine, DefensePolicy, DefenseVerdict},
    error::ServerError,
    ratelimit::{RateLimitConfig, RateLimiter},
    session::SessionIssuer,
    storage::Storage,
};

/// Outcome of one authentication attempt. The success/denied/blocked
/// variants carry their wire bodies directly; the transport collaborator
/// only picks a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Valid credential: a session token and the deployment salt.
    Granted(AuthSuccess),
    /// Invalid credential below the failure threshold.
    Denied(AuthDenied),
    /// The source IP is blocked. Generic by design: no attempt count, no
    /// hint whether the credential was correct.
    Blocked(BlockedNotice),
    /// Too many requests from this IP; the credential was never examined.
    RateLimited,
    /// The failure policy wiped the vault. When `shutdown` is set the
    /// runtime must terminate after responding.
    Wiped {
        /// Whether the runtime must terminate the process.
        shutdown: bool,
    },
}

/// Authenticates clients against the deployment passphrase hash.
#[derive(Clone)]
pub struct Authenticator<S: Storage, E: Environment> {
    auth_hash: String,
    kdf_salt: String,
    defense: DefenseMachine<S, E>,
    issuer: std::sync::Arc<SessionIssuer>,
    limiter: RateLimiter<E>,
    env: E,
}

impl<S: Storage, E: Environment> Authenticator<S, E> {
    /// Build the full authentication stack from deployment configuration.
    pub fn new(config: &ServerConfig, storage: S, env: E) -> Self {
        Self {
            auth_hash: config.auth_hash.clone(),
            kdf_salt: config.kdf_salt.clone(),
            defense: DefenseMachine::new(storage, env.clone(), DefensePolicy::from_config(config)),
            issuer: std::sync::Arc::new(SessionIssuer::new(
                &config.session_secret,
                config.session_ttl_minutes,
            )),
            limiter: RateLimiter::new(env.clone(), RateLimitConfig::auth()),
            env,
        }
    }

    /// Process one authentication attempt from `ip`.
    ///
    /// `submitted_hash` is the client's `base64(SHA-256(normalized
    /// words))`; the words themselves never reach the server.
    pub fn authenticate(&self, ip: &str, submitted_hash: &str) -> Result<AuthOutcome, ServerError> {
        if !self.limiter.is_allowed(ip) {
            tracing::warn!(ip, "rate limit exceeded");
            return Ok(AuthOutcome::RateLimited);
        }

        // Blocked IPs are rejected before the comparison is attempted.
        if let BlockStatus::Blocked { .. } = self.defense.check_ip_blocked(ip)? {
            return Ok(AuthOutcome::Blocked(BlockedNotice::new()));
        }

        if constant_time_eq(submitted_hash, &self.auth_hash) {
            self.defense.reset_failures(ip)?;
            tracing::info!(ip, "authentication success");

            let (token, expires_in) = self.issuer.issue(self.env.wall_clock_secs())?;
            return Ok(AuthOutcome::Granted(AuthSuccess {
                token,
                kdf_salt: self.kdf_salt.clone(),
                expires_in,
            }));
        }

        let outcome = match self.defense.record_failure(ip)? {
            DefenseVerdict::Denied { remaining_attempts } => {
                AuthOutcome::Denied(AuthDenied::new(remaining_attempts))
            },
            // the block applies to the *next* attempt; this response still
            // reads as a credential failure with nothing left
            DefenseVerdict::BlockedTemporarily { .. } | DefenseVerdict::BlockedPermanently => {
                AuthOutcome::Denied(AuthDenied::new(0))
            },
            DefenseVerdict::Wiped { shutdown } => AuthOutcome::Wiped { shutdown },
        };

        Ok(outcome)
    }

    /// The public deployment salt (served unauthenticated).
    pub fn kdf_salt(&self) -> &str {
        &self.kdf_salt
    }

    /// Token verification handle for the transport collaborators.
    pub fn session_issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// The defense machine (startup sweeps, halt checks).
    pub fn defense(&self) -> &DefenseMachine<S, E> {
        &self.defense
    }
}

/// Constant-time string comparison.
///
/// A length mismatch still burns one comparison so the reject path costs
/// the same; the comparison itself never short-circuits on a partial
/// match.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        let _ = a.as_bytes().ct_eq(a.as_bytes());
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_compare_equal() {
        assert!(constant_time_eq("abc123", "abc123"));
    }

    #[test]
    fn unequal_strings_compare_unequal() {
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc123", "abc12"));
        assert!(!constant_time_eq("", "x"));
    }

    #[test]
    fn empty_strings_compare_equal() {
        assert!(constant_time_eq("", ""));
    }
}
