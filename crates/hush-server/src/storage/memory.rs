#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{AuthFailureRecord, BlockedIp, Storage, StorageError};

/// In-memory storage implementation for testing and simulation.
///
/// Uses `HashMap` behind a single `Arc<Mutex<>>` so clones share state and
/// every operation is one atomic critical section. Uses `lock().expect()`
/// which will panic if the mutex is poisoned - acceptable for test code.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

struct MemoryStorageInner {
    /// Failure records keyed by IP
    failures: HashMap<String, AuthFailureRecord>,

    /// Blocks keyed by IP
    blocks: HashMap<String, BlockedIp>,

    /// Opaque message ciphertext keyed by message id
    messages: HashMap<String, Vec<u8>>,

    /// Opaque thread metadata ciphertext keyed by thread id
    threads: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStorageInner {
                failures: HashMap::new(),
                blocks: HashMap::new(),
                messages: HashMap::new(),
                threads: HashMap::new(),
            })),
        }
    }

    /// Number of IPs with an active failure record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn tracked_ip_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").failures.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn record_auth_failure(
        &self,
        ip: &str,
        now_secs: u64,
    ) -> Result<AuthFailureRecord, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let record = inner
            .failures
            .entry(ip.to_string())
            .and_modify(|r| {
                r.failure_count += 1;
                r.last_failure_at = now_secs;
            })
            .or_insert_with(|| AuthFailureRecord {
                ip: ip.to_string(),
                failure_count: 1,
                first_failure_at: now_secs,
                last_failure_at: now_secs,
            });

        Ok(record.clone())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn auth_failure_count(&self, ip: &str) -> Result<u32, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.failures.get(ip).map_or(0, |r| r.failure_count))
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn reset_auth_failures(&self, ip: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").failures.remove(ip);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn upsert_block(&self, block: &BlockedIp) -> Result<(), StorageError> {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .blocks
            .insert(block.ip.clone(), block.clone());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn load_block(&self, ip: &str) -> Result<Option<BlockedIp>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").blocks.get(ip).cloned())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn remove_block(&self, ip: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").blocks.remove(ip);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn cleanup_expired_blocks(&self, now_secs: u64) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let before = inner.blocks.len();
        inner.blocks.retain(|_, b| match b.expires_at {
            Some(expires_at) => expires_at > now_secs,
            None => true,
        });

        Ok((before - inner.blocks.len()) as u64)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn put_message(&self, id: &str, blob: &[u8]) -> Result<(), StorageError> {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .messages
            .insert(id.to_string(), blob.to_vec());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn message_count(&self) -> Result<u64, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").messages.len() as u64)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn put_thread(&self, id: &str, blob: &[u8]) -> Result<(), StorageError> {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .threads
            .insert(id.to_string(), blob.to_vec());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn thread_count(&self) -> Result<u64, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").threads.len() as u64)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn wipe_all(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.messages.clear();
        inner.threads.clear();
        inner.blocks.clear();
        inner.failures.clear();
        Ok(())
    }
}
