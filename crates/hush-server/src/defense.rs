//! The authentication defense state machine.
//!
//! Tracks per-IP failure streaks and escalates per the deployment policy,
//! up to destructive vault wipe. The machine owns its storage mutations
//! (counter upserts, block inserts, the wipe itself) because they *are* the
//! state; what it cannot do - terminating the process - it demands through
//! an explicit [`DefenseVerdict`] that the embedding runtime must execute.
//! Destruction is a deliberate terminal outcome, not an error path.
//!
//! Temporary blocks expire by timestamp comparison at check time; there are
//! no timers. Expired rows are deleted when observed, and
//! [`cleanup_expired_blocks`](DefenseMachine::cleanup_expired_blocks)
//! sweeps eagerly on demand (e.g. at startup).

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use hush_core::Environment;

use crate::{
    config::{FailureMode, ServerConfig},
    storage::{BlockedIp, Storage, StorageError},
};

/// Reason recorded on blocks applied by this machine.
const BLOCK_REASON: &str = "auth_failure_threshold";

/// Defense policy, fixed at deployment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefensePolicy {
    /// Failures allowed before the failure mode triggers.
    pub max_auth_failures: u32,
    /// Escalation applied at the threshold.
    pub failure_mode: FailureMode,
    /// Temporary block duration in minutes.
    pub ip_block_minutes: u64,
    /// Any single failure wipes and shuts down.
    pub panic_mode: bool,
}

impl DefensePolicy {
    /// Extract the policy from the deployment configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            max_auth_failures: config.max_auth_failures,
            failure_mode: config.failure_mode,
            ip_block_minutes: config.ip_block_minutes,
            panic_mode: config.panic_mode,
        }
    }
}

/// Result of the cheap pre-comparison block check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    /// IP is not blocked; authentication may proceed.
    Clear,
    /// IP is blocked. `expires_at` is `None` for permanent blocks.
    Blocked {
        /// Unix seconds the block ends, if temporary.
        expires_at: Option<u64>,
    },
}

/// Outcome of recording an authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefenseVerdict {
    /// Below the threshold; the caller reports remaining attempts.
    Denied {
        /// Attempts left before the policy triggers.
        remaining_attempts: u32,
    },
    /// Threshold reached; a temporary block was applied.
    BlockedTemporarily {
        /// Unix seconds the block ends.
        expires_at: u64,
    },
    /// Threshold reached; a permanent block was applied.
    BlockedPermanently,
    /// Storage was irreversibly wiped. When `shutdown` is set the
    /// embedding runtime must terminate the process - there is nothing
    /// left to serve and the machine stays halted until it does.
    Wiped {
        /// Whether the runtime must terminate the process.
        shutdown: bool,
    },
}

/// Per-IP failure tracking with policy escalation.
///
/// Clone shares state: the halt flag and storage are common to all clones,
/// so a wipe observed by one request handler halts them all.
#[derive(Clone)]
pub struct DefenseMachine<S: Storage, E: Environment> {
    storage: S,
    env: E,
    policy: DefensePolicy,
    halted: Arc<AtomicBool>,
}

impl<S: Storage, E: Environment> DefenseMachine<S, E> {
    /// Create a machine over storage and environment.
    pub fn new(storage: S, env: E, policy: DefensePolicy) -> Self {
        Self { storage, env, policy, halted: Arc::new(AtomicBool::new(false)) }
    }

    /// Check whether an IP is currently blocked.
    ///
    /// Runs before any credential comparison (cheap check first). An
    /// expired temporary block is deleted on observation and reported as
    /// [`BlockStatus::Clear`].
    pub fn check_ip_blocked(&self, ip: &str) -> Result<BlockStatus, StorageError> {
        let Some(block) = self.storage.load_block(ip)? else {
            return Ok(BlockStatus::Clear);
        };

        match block.expires_at {
            None => Ok(BlockStatus::Blocked { expires_at: None }),
            Some(expires_at) if expires_at > self.env.wall_clock_secs() => {
                Ok(BlockStatus::Blocked { expires_at: Some(expires_at) })
            },
            Some(_) => {
                self.storage.remove_block(ip)?;
                tracing::info!(ip, "IP block expired");
                Ok(BlockStatus::Clear)
            },
        }
    }

    /// Record one authentication failure and apply the policy if the
    /// threshold is reached.
    ///
    /// The counter increment is a single atomic read-modify-write in
    /// storage, so concurrent failures cannot race past the threshold.
    pub fn record_failure(&self, ip: &str) -> Result<DefenseVerdict, StorageError> {
        if self.halted.load(Ordering::SeqCst) {
            return Ok(DefenseVerdict::Wiped { shutdown: true });
        }

        if self.policy.panic_mode {
            tracing::error!(ip, "PANIC MODE - single failure triggers destruction");
            return self.wipe(true);
        }

        let now = self.env.wall_clock_secs();
        let record = self.storage.record_auth_failure(ip, now)?;
        let remaining = self.policy.max_auth_failures.saturating_sub(record.failure_count);

        tracing::warn!(ip, remaining, "authentication failure");

        if remaining == 0 {
            self.trigger_policy(ip)
        } else {
            Ok(DefenseVerdict::Denied { remaining_attempts: remaining })
        }
    }

    /// Reset an IP's failure streak (successful authentication).
    pub fn reset_failures(&self, ip: &str) -> Result<(), StorageError> {
        self.storage.reset_auth_failures(ip)
    }

    /// Sweep expired temporary blocks. Returns how many were removed.
    pub fn cleanup_expired_blocks(&self) -> Result<u64, StorageError> {
        self.storage.cleanup_expired_blocks(self.env.wall_clock_secs())
    }

    /// Whether a shutdown-demanding wipe has fired.
    ///
    /// Once set the machine is terminal: every further failure reports
    /// [`DefenseVerdict::Wiped`] until the runtime terminates.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    fn trigger_policy(&self, ip: &str) -> Result<DefenseVerdict, StorageError> {
        match self.policy.failure_mode {
            FailureMode::IpTemp => {
                let now = self.env.wall_clock_secs();
                let expires_at = now + self.policy.ip_block_minutes * 60;

                self.storage.upsert_block(&BlockedIp {
                    ip: ip.to_string(),
                    blocked_at: now,
                    expires_at: Some(expires_at),
                    reason: BLOCK_REASON.to_string(),
                })?;
                self.storage.reset_auth_failures(ip)?;

                tracing::warn!(ip, expires_at, "IP blocked (temporary)");
                Ok(DefenseVerdict::BlockedTemporarily { expires_at })
            },

            FailureMode::IpPerm => {
                self.storage.upsert_block(&BlockedIp {
                    ip: ip.to_string(),
                    blocked_at: self.env.wall_clock_secs(),
                    expires_at: None,
                    reason: BLOCK_REASON.to_string(),
                })?;
                self.storage.reset_auth_failures(ip)?;

                tracing::warn!(ip, "IP blocked (permanent)");
                Ok(DefenseVerdict::BlockedPermanently)
            },

            FailureMode::DbWipe => self.wipe(false),
            FailureMode::DbWipeShutdown => self.wipe(true),
        }
    }

    fn wipe(&self, shutdown: bool) -> Result<DefenseVerdict, StorageError> {
        tracing::error!("VAULT WIPED - security policy triggered");
        self.storage.wipe_all()?;

        if shutdown {
            self.halted.store(true, Ordering::SeqCst);
            tracing::error!("SECURITY SHUTDOWN REQUESTED");
        }

        Ok(DefenseVerdict::Wiped { shutdown })
    }
}

#[cfg(test)]
mod tests {
    use hush_harness::SimEnv;

    use super::*;
    use crate::storage::MemoryStorage;

    fn machine(mode: FailureMode, panic_mode: bool) -> (DefenseMachine<MemoryStorage, SimEnv>, SimEnv) {
        let env = SimEnv::seeded(0);
        let policy = DefensePolicy {
            max_auth_failures: 3,
            failure_mode: mode,
            ip_block_minutes: 60,
            panic_mode,
        };
        (DefenseMachine::new(MemoryStorage::new(), env.clone(), policy), env)
    }

    #[test]
    fn failures_below_threshold_report_remaining() {
        let (defense, _env) = machine(FailureMode::IpTemp, false);

        assert_eq!(
            defense.record_failure("10.0.0.5").unwrap(),
            DefenseVerdict::Denied { remaining_attempts: 2 }
        );
        assert_eq!(
            defense.record_failure("10.0.0.5").unwrap(),
            DefenseVerdict::Denied { remaining_attempts: 1 }
        );
    }

    #[test]
    fn threshold_applies_temporary_block() {
        let (defense, env) = machine(FailureMode::IpTemp, false);
        let start = env.wall_clock_secs();

        defense.record_failure("10.0.0.5").unwrap();
        defense.record_failure("10.0.0.5").unwrap();
        let verdict = defense.record_failure("10.0.0.5").unwrap();

        assert_eq!(verdict, DefenseVerdict::BlockedTemporarily { expires_at: start + 3600 });
        assert!(matches!(
            defense.check_ip_blocked("10.0.0.5").unwrap(),
            BlockStatus::Blocked { expires_at: Some(_) }
        ));
    }

    #[test]
    fn temporary_block_expires_at_check_time() {
        let (defense, env) = machine(FailureMode::IpTemp, false);

        for _ in 0..3 {
            defense.record_failure("10.0.0.5").unwrap();
        }
        assert!(matches!(
            defense.check_ip_blocked("10.0.0.5").unwrap(),
            BlockStatus::Blocked { .. }
        ));

        env.advance_secs(61 * 60);
        assert_eq!(defense.check_ip_blocked("10.0.0.5").unwrap(), BlockStatus::Clear);
    }

    #[test]
    fn permanent_block_never_expires() {
        let (defense, env) = machine(FailureMode::IpPerm, false);

        for _ in 0..3 {
            defense.record_failure("10.0.0.5").unwrap();
        }

        env.advance_secs(365 * 24 * 3600);
        assert_eq!(
            defense.check_ip_blocked("10.0.0.5").unwrap(),
            BlockStatus::Blocked { expires_at: None }
        );
    }

    #[test]
    fn reset_restores_full_budget() {
        let (defense, _env) = machine(FailureMode::IpTemp, false);

        defense.record_failure("10.0.0.5").unwrap();
        defense.record_failure("10.0.0.5").unwrap();
        defense.reset_failures("10.0.0.5").unwrap();

        assert_eq!(
            defense.record_failure("10.0.0.5").unwrap(),
            DefenseVerdict::Denied { remaining_attempts: 2 }
        );
    }

    #[test]
    fn counter_is_fresh_after_block_expiry() {
        let (defense, env) = machine(FailureMode::IpTemp, false);

        for _ in 0..3 {
            defense.record_failure("10.0.0.5").unwrap();
        }
        env.advance_secs(61 * 60);
        assert_eq!(defense.check_ip_blocked("10.0.0.5").unwrap(), BlockStatus::Clear);

        // after the block lapses the IP gets a fresh budget
        assert_eq!(
            defense.record_failure("10.0.0.5").unwrap(),
            DefenseVerdict::Denied { remaining_attempts: 2 }
        );
    }

    #[test]
    fn db_wipe_erases_storage_but_keeps_serving() {
        let env = SimEnv::seeded(0);
        let storage = MemoryStorage::new();
        storage.put_message("m1", b"ciphertext").unwrap();

        let policy = DefensePolicy {
            max_auth_failures: 1,
            failure_mode: FailureMode::DbWipe,
            ip_block_minutes: 60,
            panic_mode: false,
        };
        let defense = DefenseMachine::new(storage.clone(), env, policy);

        let verdict = defense.record_failure("10.0.0.5").unwrap();
        assert_eq!(verdict, DefenseVerdict::Wiped { shutdown: false });
        assert_eq!(storage.message_count().unwrap(), 0);
        assert!(!defense.is_halted());
    }

    #[test]
    fn db_wipe_shutdown_is_terminal() {
        let (defense, _env) = machine(FailureMode::DbWipeShutdown, false);

        for _ in 0..2 {
            defense.record_failure("10.0.0.5").unwrap();
        }
        let verdict = defense.record_failure("10.0.0.5").unwrap();
        assert_eq!(verdict, DefenseVerdict::Wiped { shutdown: true });
        assert!(defense.is_halted());

        // terminal: any further failure, from any IP, reports the wipe
        assert_eq!(
            defense.record_failure("99.99.99.99").unwrap(),
            DefenseVerdict::Wiped { shutdown: true }
        );
    }

    #[test]
    fn panic_mode_destroys_on_first_failure() {
        let (defense, _env) = machine(FailureMode::IpTemp, true);

        let verdict = defense.record_failure("10.0.0.5").unwrap();
        assert_eq!(verdict, DefenseVerdict::Wiped { shutdown: true });
        assert!(defense.is_halted());
    }

    #[test]
    fn cleanup_sweeps_expired_blocks() {
        let (defense, env) = machine(FailureMode::IpTemp, false);

        for _ in 0..3 {
            defense.record_failure("10.0.0.5").unwrap();
        }

        env.advance_secs(61 * 60);
        assert_eq!(defense.cleanup_expired_blocks().unwrap(), 1);
    }

    #[test]
    fn clones_share_the_halt_flag() {
        let (defense, _env) = machine(FailureMode::IpTemp, true);
        let clone = defense.clone();

        defense.record_failure("10.0.0.5").unwrap();
        assert!(clone.is_halted());
    }
}
