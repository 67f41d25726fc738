//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! Defense state (failure records, blocks) survives server restarts, which
//! is what makes the escalation policy authoritative rather than advisory.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use super::{AuthFailureRecord, BlockedIp, Storage, StorageError};

/// Table: auth_failures
/// Key: IP address string
/// Value: CBOR-encoded `AuthFailureRecord`
const AUTH_FAILURES: TableDefinition<&str, &[u8]> = TableDefinition::new("auth_failures");

/// Table: blocked_ips
/// Key: IP address string
/// Value: CBOR-encoded `BlockedIp`
const BLOCKED_IPS: TableDefinition<&str, &[u8]> = TableDefinition::new("blocked_ips");

/// Table: messages
/// Key: message id
/// Value: opaque ciphertext blob
const MESSAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

/// Table: threads
/// Key: thread id
/// Value: opaque ciphertext blob
const THREADS: TableDefinition<&str, &[u8]> = TableDefinition::new("threads");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        let txn = db.begin_write().map_err(io_err)?;
        {
            let _ = txn.open_table(AUTH_FAILURES).map_err(io_err)?;
            let _ = txn.open_table(BLOCKED_IPS).map_err(io_err)?;
            let _ = txn.open_table(MESSAGES).map_err(io_err)?;
            let _ = txn.open_table(THREADS).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn count(&self, table_def: TableDefinition<'_, &str, &[u8]>) -> Result<u64, StorageError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(table_def).map_err(io_err)?;
        table.len().map_err(io_err)
    }

    fn put_blob(
        &self,
        table_def: TableDefinition<'_, &str, &[u8]>,
        id: &str,
        blob: &[u8],
    ) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(table_def).map_err(io_err)?;
            table.insert(id, blob).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }
}

impl Storage for RedbStorage {
    fn record_auth_failure(
        &self,
        ip: &str,
        now_secs: u64,
    ) -> Result<AuthFailureRecord, StorageError> {
        // One write transaction makes the read-modify-write atomic:
        // concurrent failures serialize and each observes a distinct count.
        let txn = self.db.begin_write().map_err(io_err)?;

        let updated = {
            let mut table = txn.open_table(AUTH_FAILURES).map_err(io_err)?;

            let updated = match table.get(ip).map_err(io_err)? {
                Some(guard) => {
                    let mut record: AuthFailureRecord = decode(guard.value())?;
                    record.failure_count += 1;
                    record.last_failure_at = now_secs;
                    record
                },
                None => AuthFailureRecord {
                    ip: ip.to_string(),
                    failure_count: 1,
                    first_failure_at: now_secs,
                    last_failure_at: now_secs,
                },
            };

            let bytes = encode(&updated)?;
            table.insert(ip, bytes.as_slice()).map_err(io_err)?;
            updated
        };

        txn.commit().map_err(io_err)?;
        Ok(updated)
    }

    fn auth_failure_count(&self, ip: &str) -> Result<u32, StorageError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(AUTH_FAILURES).map_err(io_err)?;

        match table.get(ip).map_err(io_err)? {
            Some(guard) => {
                let record: AuthFailureRecord = decode(guard.value())?;
                Ok(record.failure_count)
            },
            None => Ok(0),
        }
    }

    fn reset_auth_failures(&self, ip: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(AUTH_FAILURES).map_err(io_err)?;
            table.remove(ip).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn upsert_block(&self, block: &BlockedIp) -> Result<(), StorageError> {
        let bytes = encode(block)?;

        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(BLOCKED_IPS).map_err(io_err)?;
            table.insert(block.ip.as_str(), bytes.as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn load_block(&self, ip: &str) -> Result<Option<BlockedIp>, StorageError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(BLOCKED_IPS).map_err(io_err)?;

        match table.get(ip).map_err(io_err)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn remove_block(&self, ip: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(BLOCKED_IPS).map_err(io_err)?;
            table.remove(ip).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn cleanup_expired_blocks(&self, now_secs: u64) -> Result<u64, StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;

        let removed = {
            let mut table = txn.open_table(BLOCKED_IPS).map_err(io_err)?;

            let mut expired = Vec::new();
            for entry in table.iter().map_err(io_err)? {
                let (key, value) = entry.map_err(io_err)?;
                let block: BlockedIp = decode(value.value())?;
                if let Some(expires_at) = block.expires_at {
                    if expires_at <= now_secs {
                        expired.push(key.value().to_string());
                    }
                }
            }

            for ip in &expired {
                table.remove(ip.as_str()).map_err(io_err)?;
            }

            expired.len() as u64
        };

        txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn put_message(&self, id: &str, blob: &[u8]) -> Result<(), StorageError> {
        self.put_blob(MESSAGES, id, blob)
    }

    fn message_count(&self) -> Result<u64, StorageError> {
        self.count(MESSAGES)
    }

    fn put_thread(&self, id: &str, blob: &[u8]) -> Result<(), StorageError> {
        self.put_blob(THREADS, id, blob)
    }

    fn thread_count(&self) -> Result<u64, StorageError> {
        self.count(THREADS)
    }

    fn wipe_all(&self) -> Result<(), StorageError> {
        // Single transaction: either everything is gone or nothing is.
        let txn = self.db.begin_write().map_err(io_err)?;

        for table_def in [MESSAGES, THREADS, BLOCKED_IPS, AUTH_FAILURES] {
            let mut table = txn.open_table(table_def).map_err(io_err)?;

            let mut keys = Vec::new();
            for entry in table.iter().map_err(io_err)? {
                let (key, _) = entry.map_err(io_err)?;
                keys.push(key.value().to_string());
            }

            for key in &keys {
                table.remove(key.as_str()).map_err(io_err)?;
            }
        }

        txn.commit().map_err(io_err)?;
        Ok(())
    }
}

fn io_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Io(err.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("hush.redb")).unwrap();
        (dir, storage)
    }

    #[test]
    fn failure_record_roundtrip() {
        let (_dir, storage) = open_temp();

        let r1 = storage.record_auth_failure("10.0.0.5", 100).unwrap();
        assert_eq!(r1.failure_count, 1);

        let r2 = storage.record_auth_failure("10.0.0.5", 150).unwrap();
        assert_eq!(r2.failure_count, 2);
        assert_eq!(r2.first_failure_at, 100);
        assert_eq!(r2.last_failure_at, 150);

        assert_eq!(storage.auth_failure_count("10.0.0.5").unwrap(), 2);
    }

    #[test]
    fn block_roundtrip_and_cleanup() {
        let (_dir, storage) = open_temp();

        let temp_block = BlockedIp {
            ip: "10.0.0.5".to_string(),
            blocked_at: 100,
            expires_at: Some(200),
            reason: "auth_failure_threshold".to_string(),
        };
        let perm_block = BlockedIp {
            ip: "10.0.0.6".to_string(),
            blocked_at: 100,
            expires_at: None,
            reason: "auth_failure_threshold".to_string(),
        };
        storage.upsert_block(&temp_block).unwrap();
        storage.upsert_block(&perm_block).unwrap();

        assert_eq!(storage.load_block("10.0.0.5").unwrap(), Some(temp_block));

        let removed = storage.cleanup_expired_blocks(500).unwrap();
        assert_eq!(removed, 1);
        assert!(storage.load_block("10.0.0.5").unwrap().is_none());
        assert_eq!(storage.load_block("10.0.0.6").unwrap(), Some(perm_block));
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hush.redb");

        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.record_auth_failure("10.0.0.5", 100).unwrap();
            storage
                .upsert_block(&BlockedIp {
                    ip: "10.0.0.9".to_string(),
                    blocked_at: 100,
                    expires_at: None,
                    reason: "auth_failure_threshold".to_string(),
                })
                .unwrap();
        }

        let reopened = RedbStorage::open(&path).unwrap();
        assert_eq!(reopened.auth_failure_count("10.0.0.5").unwrap(), 1);
        assert!(reopened.load_block("10.0.0.9").unwrap().is_some());
    }

    #[test]
    fn wipe_erases_all_tables() {
        let (_dir, storage) = open_temp();

        storage.put_message("m1", b"ciphertext").unwrap();
        storage.put_message("m2", b"ciphertext").unwrap();
        storage.put_thread("t1", b"ciphertext").unwrap();
        storage.record_auth_failure("10.0.0.5", 100).unwrap();

        storage.wipe_all().unwrap();

        assert_eq!(storage.message_count().unwrap(), 0);
        assert_eq!(storage.thread_count().unwrap(), 0);
        assert_eq!(storage.auth_failure_count("10.0.0.5").unwrap(), 0);
    }

    #[test]
    fn wipe_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hush.redb");

        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.put_message("m1", b"ciphertext").unwrap();
            storage.wipe_all().unwrap();
        }

        let reopened = RedbStorage::open(&path).unwrap();
        assert_eq!(reopened.message_count().unwrap(), 0);
    }
}
