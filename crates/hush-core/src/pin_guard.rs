//! Local PIN attempt throttle.
//!
//! A PIN has far less entropy than the 12-word passphrase, so the PIN
//! unlock path gets its own escalation mirroring the server's defense
//! machine: repeated failures lock the path out, repeated lockouts demand
//! destruction of the envelope. The passphrase path is never affected -
//! destroying the envelope only removes the shortcut.

/// Escalation policy for PIN unlock attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAttemptPolicy {
    /// Failures allowed before a lockout begins.
    pub max_failures: u32,
    /// Lockout duration in seconds.
    pub lockout_secs: u64,
    /// Lockouts allowed before the envelope must be destroyed.
    pub destroy_after_lockouts: u32,
}

impl Default for PinAttemptPolicy {
    fn default() -> Self {
        Self { max_failures: 5, lockout_secs: 300, destroy_after_lockouts: 3 }
    }
}

/// Whether a PIN unlock attempt may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinGate {
    /// Attempt allowed.
    Open,
    /// Locked out until the given wall-clock time (Unix seconds).
    LockedOut {
        /// When the lockout ends.
        until_secs: u64,
    },
    /// Terminal: the envelope must be deleted; unlock falls back to the
    /// passphrase path.
    DestroyEnvelope,
}

/// Per-device PIN attempt tracker.
///
/// Pure state machine: callers feed it wall-clock seconds from their
/// [`crate::Environment`] and persist it alongside the envelope. Expiry is
/// evaluated by timestamp comparison at check time, not by timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinAttemptGuard {
    policy: PinAttemptPolicy,
    failures: u32,
    lockouts: u32,
    locked_until: Option<u64>,
    destroyed: bool,
}

impl PinAttemptGuard {
    /// Create a fresh guard under a policy.
    pub fn new(policy: PinAttemptPolicy) -> Self {
        Self { policy, failures: 0, lockouts: 0, locked_until: None, destroyed: false }
    }

    /// Gate an unlock attempt at the given wall-clock time.
    pub fn check(&self, now_secs: u64) -> PinGate {
        if self.destroyed {
            return PinGate::DestroyEnvelope;
        }

        match self.locked_until {
            Some(until) if now_secs < until => PinGate::LockedOut { until_secs: until },
            _ => PinGate::Open,
        }
    }

    /// Record a failed unseal and return the resulting gate.
    ///
    /// Reaching the failure budget starts a lockout; exhausting the lockout
    /// budget is terminal.
    pub fn record_failure(&mut self, now_secs: u64) -> PinGate {
        if self.destroyed {
            return PinGate::DestroyEnvelope;
        }

        self.failures += 1;

        if self.failures >= self.policy.max_failures {
            self.failures = 0;
            self.lockouts += 1;

            if self.lockouts >= self.policy.destroy_after_lockouts {
                self.destroyed = true;
                return PinGate::DestroyEnvelope;
            }

            let until = now_secs + self.policy.lockout_secs;
            self.locked_until = Some(until);
            return PinGate::LockedOut { until_secs: until };
        }

        PinGate::Open
    }

    /// Record a successful unseal: clears failures and any lockout.
    pub fn record_success(&mut self) {
        if !self.destroyed {
            self.failures = 0;
            self.lockouts = 0;
            self.locked_until = None;
        }
    }

    /// Failures since the last success or lockout.
    pub fn failure_count(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PinAttemptGuard {
        PinAttemptGuard::new(PinAttemptPolicy {
            max_failures: 3,
            lockout_secs: 60,
            destroy_after_lockouts: 2,
        })
    }

    #[test]
    fn fresh_guard_is_open() {
        assert_eq!(guard().check(1000), PinGate::Open);
    }

    #[test]
    fn lockout_begins_at_failure_budget() {
        let mut g = guard();

        assert_eq!(g.record_failure(1000), PinGate::Open);
        assert_eq!(g.record_failure(1001), PinGate::Open);
        assert_eq!(g.record_failure(1002), PinGate::LockedOut { until_secs: 1062 });

        assert_eq!(g.check(1010), PinGate::LockedOut { until_secs: 1062 });
    }

    #[test]
    fn lockout_expires_by_timestamp_comparison() {
        let mut g = guard();
        for t in 0..3 {
            g.record_failure(1000 + t);
        }

        assert!(matches!(g.check(1061), PinGate::LockedOut { .. }));
        assert_eq!(g.check(1062), PinGate::Open);
    }

    #[test]
    fn success_resets_failures() {
        let mut g = guard();
        g.record_failure(1000);
        g.record_failure(1001);
        g.record_success();

        assert_eq!(g.failure_count(), 0);
        // the budget starts over
        assert_eq!(g.record_failure(1002), PinGate::Open);
        assert_eq!(g.record_failure(1003), PinGate::Open);
    }

    #[test]
    fn second_lockout_is_terminal() {
        let mut g = guard();

        for t in 0..3 {
            g.record_failure(1000 + t);
        }
        // wait out the lockout, fail again
        for t in 0..2 {
            assert_eq!(g.record_failure(2000 + t), PinGate::Open);
        }
        assert_eq!(g.record_failure(2002), PinGate::DestroyEnvelope);

        // terminal: nothing reopens the gate
        assert_eq!(g.check(9999), PinGate::DestroyEnvelope);
        g.record_success();
        assert_eq!(g.check(9999), PinGate::DestroyEnvelope);
    }
}
