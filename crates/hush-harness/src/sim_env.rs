//! Simulated environment: virtual clock, seeded RNG.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use hush_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Wall-clock origin for simulations (2023-11-14T22:13:20Z).
const SIM_WALL_CLOCK_START: u64 = 1_700_000_000;

/// Deterministic environment for tests.
///
/// Clones share the same clock and RNG, matching how production code clones
/// its environment into workers. Monotonic time and wall-clock time advance
/// together, either explicitly via [`advance`](Self::advance) or through
/// `sleep`.
#[derive(Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimEnvInner>>,
}

struct SimEnvInner {
    elapsed: Duration,
    wall_secs: u64,
    rng: ChaCha20Rng,
}

impl SimEnv {
    /// Create a simulation environment from an RNG seed.
    ///
    /// The same seed always produces the same random byte sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimEnvInner {
                elapsed: Duration::ZERO,
                wall_secs: SIM_WALL_CLOCK_START,
                rng: ChaCha20Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Advance both clocks by a duration.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, duration: Duration) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.elapsed += duration;
        inner.wall_secs += duration.as_secs();
    }

    /// Advance both clocks by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn now(&self) -> Duration {
        self.inner.lock().expect("Mutex poisoned").elapsed
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let env = self.clone();
        async move {
            // virtual time: sleeping advances the clock instead of waiting
            env.advance(duration);
        }
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.inner.lock().expect("Mutex poisoned").rng.fill_bytes(buffer);
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        self.inner.lock().expect("Mutex poisoned").wall_secs
    }
}
