//! Fuzz target for sidecar decoding.
//!
//! Feeds arbitrary bytes to the decoder and re-encodes whatever it accepts,
//! checking for panics and for accepted documents that do not read back
//! unchanged.

#![no_main]

use annota::schema::codec::{decode_slice, decode_str, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(document) = decode_slice(data, "<fuzz>") else {
        return;
    };
    let text = encode(&document, 2).expect("accepted documents encode");
    let restored = decode_str(&text, "<fuzz>").expect("encoded documents decode");
    assert_eq!(restored, document);
});
