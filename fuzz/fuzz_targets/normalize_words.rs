//! Fuzz target for passphrase normalization
//!
//! Normalization sits on both sides of the authentication boundary, so it
//! must be total and idempotent for every possible input string.

#![no_main]

use hush_crypto::{hash_words, normalize_words};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let once = normalize_words(input);
    let twice = normalize_words(&once);
    assert_eq!(once, twice, "normalization must be idempotent");

    // hashing is stable across re-normalization
    assert_eq!(hash_words(input), hash_words(&once));
});
