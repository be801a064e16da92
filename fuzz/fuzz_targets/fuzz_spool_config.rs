//! Fuzz target for spool.json parsing and capacity normalization.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spool_config::{storage_capacity_enforcer, SpoolConfig, MAX_CAPACITY_MB, MIN_CAPACITY_MB};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SpoolConfig::from_json(text) {
        if let Ok(enforcer) = storage_capacity_enforcer(config.capacity_text().as_deref()) {
            let mb = enforcer.current_value();
            assert!((MIN_CAPACITY_MB..=MAX_CAPACITY_MB).contains(&mb));
        }
    }
});
