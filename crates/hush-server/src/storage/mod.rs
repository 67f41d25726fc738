//! Storage abstraction for the server core.
//!
//! Trait-based abstraction over the security tables (`auth_failures`,
//! `blocked_ips`) and the opaque ciphertext stores the defense machine can
//! wipe. The trait is synchronous (no async) to keep the state machines
//! synchronous; implementations share internal state via Arc so clones
//! access the same underlying storage.

mod error;
mod memory;
mod redb;

pub use error::StorageError;
pub use memory::MemoryStorage;
use serde::{Deserialize, Serialize};

pub use self::redb::RedbStorage;

/// Per-IP authentication failure record.
///
/// Policy-authoritative: survives process restarts in production storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailureRecord {
    /// Source IP address.
    pub ip: String,
    /// Consecutive failures since the last success or block.
    pub failure_count: u32,
    /// Unix seconds of the first failure in this streak.
    pub first_failure_at: u64,
    /// Unix seconds of the most recent failure.
    pub last_failure_at: u64,
}

/// A blocked source IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedIp {
    /// Blocked IP address.
    pub ip: String,
    /// Unix seconds the block was applied.
    pub blocked_at: u64,
    /// Unix seconds the block ends; `None` means permanent.
    pub expires_at: Option<u64>,
    /// Why the block exists (e.g. `auth_failure_threshold`).
    pub reason: String,
}

/// Storage abstraction for defense state and wipeable ciphertext.
///
/// Must be Clone (shared across request handlers), Send + Sync, and
/// synchronous.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Atomically record one authentication failure for an IP.
    ///
    /// A single read-modify-write under the implementation's lock or
    /// transaction: concurrent failures must each observe a distinct
    /// count, so the block triggers at exactly the configured threshold.
    /// Returns the updated record.
    fn record_auth_failure(
        &self,
        ip: &str,
        now_secs: u64,
    ) -> Result<AuthFailureRecord, StorageError>;

    /// Current failure count for an IP (0 if none recorded).
    fn auth_failure_count(&self, ip: &str) -> Result<u32, StorageError>;

    /// Clear the failure record for an IP (successful authentication, or a
    /// block was just applied).
    fn reset_auth_failures(&self, ip: &str) -> Result<(), StorageError>;

    /// Insert or update a block for an IP.
    fn upsert_block(&self, block: &BlockedIp) -> Result<(), StorageError>;

    /// Load the block for an IP, expired or not. `None` if never blocked.
    fn load_block(&self, ip: &str) -> Result<Option<BlockedIp>, StorageError>;

    /// Remove the block for an IP (expiry observed at check time).
    fn remove_block(&self, ip: &str) -> Result<(), StorageError>;

    /// Delete every temporary block whose expiry has passed.
    ///
    /// Returns the number of blocks removed. Permanent blocks are never
    /// touched.
    fn cleanup_expired_blocks(&self, now_secs: u64) -> Result<u64, StorageError>;

    /// Store an opaque message ciphertext blob.
    fn put_message(&self, id: &str, blob: &[u8]) -> Result<(), StorageError>;

    /// Number of stored message blobs.
    fn message_count(&self) -> Result<u64, StorageError>;

    /// Store an opaque thread metadata ciphertext blob.
    fn put_thread(&self, id: &str, blob: &[u8]) -> Result<(), StorageError>;

    /// Number of stored thread blobs.
    fn thread_count(&self) -> Result<u64, StorageError>;

    /// Irreversibly erase everything: messages, threads, and the security
    /// tables.
    ///
    /// This is the `db_wipe` surface. There is no undo.
    fn wipe_all(&self) -> Result<(), StorageError>;
}
