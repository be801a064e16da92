//! Fuzz target for decoding spool records.
//!
//! Spool files are untrusted input: decoding arbitrary bytes must return an
//! error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spool_core::codec;

fuzz_target!(|data: &[u8]| {
    let _ = codec::decode(data);
});
