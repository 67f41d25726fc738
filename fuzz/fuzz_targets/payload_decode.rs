//! Fuzz target for plaintext payload decoding
//!
//! This fuzzer feeds arbitrary bytes through the closed payload union with:
//! - Malformed JSON
//! - Type confusion attacks (valid payload of the wrong kind per route)
//! - Oversized strings and deeply nested structures
//!
//! The fuzzer should NEVER panic. All invalid inputs must return an error.

#![no_main]

use hush_proto::{PayloadKind, decode_payload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let kinds = [
        PayloadKind::DirectMessage,
        PayloadKind::GroupMessage,
        PayloadKind::Identity,
        PayloadKind::Contact,
    ];

    for kind in kinds {
        // any outcome is fine as long as it is an Ok/Err, not a panic
        let _ = decode_payload(data, kind);
    }
});
