//! Fail-closed send-readiness gate for group messages.
//!
//! A group message must never be encrypted under a stale or absent key.
//! Before encrypting, the sender re-fetches group state and compares its
//! cached epoch against the server's truth. Every degraded outcome refuses
//! the send; recovery (refreshing state, resending) is an explicit caller
//! action, never a silent retry under a key the user didn't approve.

use std::time::Duration;

use async_trait::async_trait;
use hush_proto::GroupStateView;
use thiserror::Error;

use crate::env::Environment;

/// Number of fetch attempts before failing closed.
const FETCH_ATTEMPTS: u32 = 2;

/// Backoff between fetch attempts.
const FETCH_BACKOFF: Duration = Duration::from_millis(250);

/// Failure reported by the group directory collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("group directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// The group membership collaborator (REST client, test double).
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Fetch current group state as seen by one member.
    async fn fetch_group_state(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> Result<GroupStateView, DirectoryError>;
}

/// Outcome of the pre-send readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReadiness {
    /// Cached epoch matches and an envelope exists; encryption may proceed.
    Ready,
    /// State could not be fetched after all attempts. Do not send.
    StateUnavailable,
    /// No wrapped envelope exists for this member at the current epoch.
    MissingEnvelope,
    /// The caller's cached epoch is superseded. Refresh to `current_epoch`
    /// and explicitly resend.
    StaleEpoch {
        /// The server's current key epoch.
        current_epoch: u64,
    },
}

/// Check whether a group send may proceed under the caller's cached epoch.
///
/// Fetches group state with up to two attempts (backoff between them).
/// Degraded outcomes are ordered: unavailable state, then a missing
/// envelope, then an epoch mismatch.
pub async fn ensure_send_readiness<D, E>(
    directory: &D,
    env: &E,
    group_id: &str,
    member_id: &str,
    cached_epoch: u64,
) -> SendReadiness
where
    D: GroupDirectory + ?Sized,
    E: Environment,
{
    let mut state: Option<GroupStateView> = None;

    for attempt in 1..=FETCH_ATTEMPTS {
        match directory.fetch_group_state(group_id, member_id).await {
            Ok(fetched) => {
                state = Some(fetched);
                break;
            },
            Err(_) if attempt < FETCH_ATTEMPTS => env.sleep(FETCH_BACKOFF).await,
            Err(_) => {},
        }
    }

    let Some(state) = state else {
        return SendReadiness::StateUnavailable;
    };

    if state.my_encrypted_key_envelope.is_none() {
        return SendReadiness::MissingEnvelope;
    }

    if state.key_epoch != cached_epoch {
        return SendReadiness::StaleEpoch { current_epoch: state.key_epoch };
    }

    SendReadiness::Ready
}
