//! Group membership and forward-secure epoch re-keying.
//!
//! Every group carries a monotonically increasing key epoch. Each epoch has
//! its own random content key, wrapped once per member under that member's
//! derivable envelope key. Every membership change - add or remove - bumps
//! the epoch and generates a brand-new content key:
//!
//! - a newly added member cannot decrypt anything from earlier epochs
//!   (forward secrecy), and
//! - a removed member cannot decrypt anything from later epochs even with
//!   retained key material (post-compromise security).
//!
//! Old epoch keys are never re-wrapped or reused.

use std::collections::HashMap;

use hush_crypto::{EncryptedBlob, VAULT_KEY_SIZE, aead};
use hush_proto::{GroupMemberView, GroupStateView, MemberRole, WireBlob};
use zeroize::Zeroize;

use crate::{env::Environment, error::CoreError, session::VaultSession};

/// The random content key for one group epoch.
///
/// Recovered by unwrapping a member's envelope; used to encrypt and decrypt
/// group message bodies for that epoch. Zeroized on drop.
pub struct GroupEpochKey {
    bytes: [u8; VAULT_KEY_SIZE],
    epoch: u64,
}

impl GroupEpochKey {
    /// Raw key bytes for the AEAD layer.
    pub fn as_bytes(&self) -> &[u8; VAULT_KEY_SIZE] {
        &self.bytes
    }

    /// The epoch this key belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for GroupEpochKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for GroupEpochKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupEpochKey")
            .field("epoch", &self.epoch)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Tracked state for one group.
#[derive(Debug, Clone)]
pub struct GroupState {
    /// Group identifier.
    pub group_id: String,
    /// Current key epoch; strictly increases on every membership change.
    pub epoch: u64,
    /// Member roster in join order.
    pub members: Vec<GroupMemberView>,
    /// Current epoch's wrapped key envelope per member id.
    envelopes: HashMap<String, EncryptedBlob>,
}

impl GroupState {
    /// The wrapped envelope for a member, if one exists for the current
    /// epoch.
    pub fn envelope_for(&self, member_id: &str) -> Option<&EncryptedBlob> {
        self.envelopes.get(member_id)
    }

    /// Whether the user is currently a member.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    fn owner_count(&self) -> usize {
        self.members.iter().filter(|m| m.role == MemberRole::Owner).count()
    }
}

/// Tracks group membership and performs epoch re-keying.
///
/// Mutations appear atomic to concurrent senders: the new roster and the
/// full set of fresh envelopes are built first, then swapped in together,
/// so a reader never observes a bumped epoch with stale envelopes. A sender
/// that cached the previous epoch detects the change through the
/// send-readiness gate and fails closed.
pub struct GroupKeyEpochManager<E: Environment> {
    env: E,
    groups: HashMap<String, GroupState>,
}

impl<E: Environment> GroupKeyEpochManager<E> {
    /// Create an empty manager.
    pub fn new(env: E) -> Self {
        Self { env, groups: HashMap::new() }
    }

    /// Create a group at epoch 1 with a fresh content key.
    ///
    /// The creator becomes `Owner`; all other initial members are
    /// `Member`. Every initial member receives an envelope.
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyMember`] for duplicate initial member ids.
    pub fn create_group(
        &mut self,
        session: &mut VaultSession,
        group_id: &str,
        creator_id: &str,
        member_ids: &[&str],
    ) -> Result<&GroupState, CoreError> {
        let joined_at = self.env.wall_clock_secs();

        let mut members = vec![GroupMemberView {
            user_id: creator_id.to_string(),
            role: MemberRole::Owner,
            joined_at,
        }];

        for &member_id in member_ids {
            if members.iter().any(|m| m.user_id == member_id) {
                return Err(CoreError::AlreadyMember {
                    group_id: group_id.to_string(),
                    user_id: member_id.to_string(),
                });
            }
            members.push(GroupMemberView {
                user_id: member_id.to_string(),
                role: MemberRole::Member,
                joined_at,
            });
        }

        let mut state =
            GroupState { group_id: group_id.to_string(), epoch: 1, members, envelopes: HashMap::new() };
        self.rewrap(session, &mut state);

        self.groups.insert(group_id.to_string(), state);
        let Some(state) = self.groups.get(group_id) else {
            unreachable!("group was inserted above");
        };
        Ok(state)
    }

    /// Add a member: bump the epoch, generate a new content key, and
    /// re-wrap it for every existing member plus the newcomer.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownGroup`] or [`CoreError::AlreadyMember`].
    pub fn add_member(
        &mut self,
        session: &mut VaultSession,
        group_id: &str,
        new_member_id: &str,
    ) -> Result<&GroupState, CoreError> {
        let joined_at = self.env.wall_clock_secs();

        let state = self
            .groups
            .get_mut(group_id)
            .ok_or_else(|| CoreError::UnknownGroup(group_id.to_string()))?;

        if state.is_member(new_member_id) {
            return Err(CoreError::AlreadyMember {
                group_id: group_id.to_string(),
                user_id: new_member_id.to_string(),
            });
        }

        let mut next = state.clone();
        next.members.push(GroupMemberView {
            user_id: new_member_id.to_string(),
            role: MemberRole::Member,
            joined_at,
        });
        next.epoch += 1;
        Self::rewrap_with_env(&self.env, session, &mut next);

        *state = next;
        Ok(state)
    }

    /// Remove a member: bump the epoch, generate a new content key, and
    /// re-wrap it for the remaining members only.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownGroup`], [`CoreError::NotAMember`],
    /// [`CoreError::SoleOwner`], or [`CoreError::EmptyGroup`].
    pub fn remove_member(
        &mut self,
        session: &mut VaultSession,
        group_id: &str,
        member_id: &str,
    ) -> Result<&GroupState, CoreError> {
        let state = self
            .groups
            .get_mut(group_id)
            .ok_or_else(|| CoreError::UnknownGroup(group_id.to_string()))?;

        let Some(position) = state.members.iter().position(|m| m.user_id == member_id) else {
            return Err(CoreError::NotAMember {
                group_id: group_id.to_string(),
                user_id: member_id.to_string(),
            });
        };

        if state.members.len() == 1 {
            return Err(CoreError::EmptyGroup(group_id.to_string()));
        }

        if state.members[position].role == MemberRole::Owner && state.owner_count() == 1 {
            return Err(CoreError::SoleOwner(group_id.to_string()));
        }

        let mut next = state.clone();
        next.members.remove(position);
        next.envelopes.remove(member_id);
        next.epoch += 1;
        Self::rewrap_with_env(&self.env, session, &mut next);

        *state = next;
        Ok(state)
    }

    /// Tracked state for a group, if any.
    pub fn group(&self, group_id: &str) -> Option<&GroupState> {
        self.groups.get(group_id)
    }

    /// The state view served to one member: roster, epoch, and only that
    /// member's envelope.
    pub fn state_view_for(&self, group_id: &str, member_id: &str) -> Option<GroupStateView> {
        let state = self.groups.get(group_id)?;

        Some(GroupStateView {
            id: state.group_id.clone(),
            key_epoch: state.epoch,
            members: state.members.clone(),
            my_encrypted_key_envelope: state.envelope_for(member_id).map(WireBlob::encode),
        })
    }

    fn rewrap(&self, session: &mut VaultSession, state: &mut GroupState) {
        Self::rewrap_with_env(&self.env, session, state);
    }

    /// Generate a fresh epoch key and wrap it for every current member.
    ///
    /// Replaces the envelope map wholesale; the raw key is zeroized before
    /// returning, so only the envelopes survive.
    fn rewrap_with_env(env: &E, session: &mut VaultSession, state: &mut GroupState) {
        let mut epoch_key = [0u8; VAULT_KEY_SIZE];
        env.random_bytes(&mut epoch_key);

        let mut envelopes = HashMap::with_capacity(state.members.len());
        for member_id in state.member_ids() {
            let wrap_key = session.member_envelope_key(&state.group_id, &member_id);
            envelopes.insert(member_id, aead::encrypt(wrap_key.as_bytes(), &epoch_key));
        }

        epoch_key.zeroize();
        state.envelopes = envelopes;
    }
}

/// Unwrap a member's envelope back into the epoch content key.
///
/// # Errors
///
/// A single generic [`hush_crypto::CryptoError::DecryptionFailed`] (via
/// [`CoreError::Crypto`]) if the envelope was not wrapped for this member
/// or has been tampered with.
pub fn unwrap_envelope(
    session: &mut VaultSession,
    group_id: &str,
    member_id: &str,
    epoch: u64,
    envelope: &EncryptedBlob,
) -> Result<GroupEpochKey, CoreError> {
    let wrap_key = session.member_envelope_key(group_id, member_id).clone();
    let mut plaintext = aead::decrypt(wrap_key.as_bytes(), envelope)?;

    if plaintext.len() != VAULT_KEY_SIZE {
        plaintext.zeroize();
        return Err(CoreError::Crypto(hush_crypto::CryptoError::DecryptionFailed));
    }

    let mut bytes = [0u8; VAULT_KEY_SIZE];
    bytes.copy_from_slice(&plaintext);
    plaintext.zeroize();

    Ok(GroupEpochKey { bytes, epoch })
}
