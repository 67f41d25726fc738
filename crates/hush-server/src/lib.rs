//! Hush server authentication core.
//!
//! The server side of the vault knows nothing about keys or plaintext - it
//! holds a single passphrase hash, a non-secret KDF salt, and a defense
//! policy. This crate implements everything security-relevant behind the
//! REST/WebSocket collaborators:
//!
//! - [`DefenseMachine`]: per-IP failure tracking with escalation up to
//!   destructive vault wipe
//! - [`Authenticator`]: rate limit → block check → constant-time hash
//!   comparison → session issuance
//! - [`SessionIssuer`]: fixed-TTL bearer tokens, no refresh path
//! - [`Storage`]: trait-based persistence (in-memory for tests,
//!   redb for production) so blocks and failure counts survive restarts
//!
//! # Architecture
//!
//! State machines are pure over the [`Environment`](hush_core::Environment)
//! and [`Storage`] seams. Destructive outcomes (wipe, shutdown) are
//! explicit verdicts the embedding runtime must execute, not exceptions -
//! a library cannot and should not terminate the process itself.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod config;
pub mod defense;
mod error;
pub mod ratelimit;
pub mod session;
pub mod storage;
mod system_env;

pub use auth::{AuthOutcome, Authenticator};
pub use config::{FailureMode, ServerConfig};
pub use defense::{BlockStatus, DefenseMachine, DefensePolicy, DefenseVerdict};
pub use error::ServerError;
pub use ratelimit::{RateLimitConfig, RateLimiter};
pub use session::{SessionClaims, SessionIssuer};
pub use storage::{AuthFailureRecord, BlockedIp, MemoryStorage, RedbStorage, Storage, StorageError};
pub use system_env::SystemEnv;
