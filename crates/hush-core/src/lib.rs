//! Hush client core.
//!
//! The stateful client-side logic above the crypto primitives: the unlocked
//! vault session and its key cache, group membership with forward-secure
//! epoch re-keying, the fail-closed send-readiness gate, and the local PIN
//! attempt throttle.
//!
//! # Lifecycle
//!
//! A [`VaultSession`] exists only between unlock and lock. It is an explicit
//! value owned by the caller - there is no process-wide key singleton - and
//! every crypto operation borrows it. Locking consumes the session and
//! zeroizes the vault key plus every cached context key before returning.
//!
//! # Determinism
//!
//! All time and randomness flows through the [`env::Environment`] trait, so
//! every state machine here runs identically under the simulation
//! environment in `hush-harness`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod error;
pub mod group;
pub mod messaging;
pub mod pin_guard;
pub mod readiness;
pub mod session;

pub use env::Environment;
pub use error::CoreError;
pub use group::{GroupEpochKey, GroupKeyEpochManager, GroupState, unwrap_envelope};
pub use messaging::{decrypt_payload, encrypt_payload};
pub use pin_guard::{PinAttemptGuard, PinAttemptPolicy, PinGate};
pub use readiness::{DirectoryError, GroupDirectory, SendReadiness, ensure_send_readiness};
pub use session::VaultSession;
