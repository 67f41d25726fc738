//! Fuzz target for the base64 blob wire format
//!
//! Exercises strict base64 decoding, the exact-IV-length rule, and the
//! size caps with arbitrary ciphertext/iv string pairs.
//!
//! The fuzzer should NEVER panic, and every accepted blob must re-encode
//! to an equivalent wire form.

#![no_main]

use arbitrary::Arbitrary;
use hush_proto::{BlobClass, WireBlob};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    ciphertext: String,
    iv: String,
}

fuzz_target!(|input: Input| {
    let wire = WireBlob { ciphertext: input.ciphertext, iv: input.iv };

    for class in [BlobClass::Message, BlobClass::Metadata] {
        if let Ok(blob) = wire.decode(class) {
            // accepted blobs round-trip
            let reencoded = WireBlob::encode(&blob);
            let again = reencoded.decode(class).expect("re-encoded blob must decode");
            assert_eq!(again, blob);
        }
    }
});
