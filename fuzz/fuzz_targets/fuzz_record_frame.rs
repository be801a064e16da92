//! Fuzz target for structured record headers.
//!
//! Builds a well-framed record around an arbitrary kind tag and payload, so
//! the fuzzer spends its time past the header line. Anything that decodes
//! must carry the original payload.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spool_core::codec;

#[derive(Arbitrary, Debug)]
struct Frame {
    kind: String,
    content_type: String,
    declared_len: Option<u64>,
    payload: Vec<u8>,
}

fuzz_target!(|frame: Frame| {
    let header = serde_json::json!({
        "format": 1,
        "kind": frame.kind,
        "content_type": frame.content_type,
        "len": frame.declared_len.unwrap_or(frame.payload.len() as u64),
    });
    let mut bytes = header.to_string().into_bytes();
    bytes.push(b'\n');
    bytes.extend_from_slice(&frame.payload);

    if let Ok(t) = codec::decode(&bytes) {
        assert_eq!(t.content(), frame.payload.as_slice());
    }
});
