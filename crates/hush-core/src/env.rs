//! Environment abstraction for deterministic testing.
//!
//! Decouples the client and server state machines from system resources
//! (time, randomness). Production code uses the system environment in
//! `hush-server`; tests use the simulated environment in `hush-harness`
//! with a virtual clock and seeded RNG.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls within one execution context must return values
    ///   `>=` previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// The only async method in the trait; used for retry backoff, never
    /// inside pure state-machine logic.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, a simulation environment produces the
    ///   same sequence of bytes
    /// - Production implementations use a cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Current wall-clock time as Unix seconds.
    ///
    /// Drives everything persisted with a timestamp: member join times,
    /// block expiries, failure records. Simulation environments advance
    /// this manually.
    fn wall_clock_secs(&self) -> u64;
}
