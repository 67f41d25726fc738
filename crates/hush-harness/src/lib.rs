//! Deterministic simulation harness for Hush testing.
//!
//! Provides [`SimEnv`], an [`Environment`] with a virtual clock and a
//! seeded RNG. Time only moves when a test advances it (or through
//! `sleep`, which advances the virtual clock instead of blocking), so
//! scenarios like "61 minutes later the block has expired" run instantly
//! and reproducibly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sim_env;

pub use sim_env::SimEnv;

#[doc(inline)]
pub use hush_core::Environment;
