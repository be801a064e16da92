//! Process-scoped identity.
//!
//! A [`ProcessToken`] is generated once when the hosting process starts and
//! handed to every component that names files on disk. Two processes sharing
//! one spool directory never produce the same staging file name, even when
//! their clocks agree to the millisecond.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the base32 token.
const TOKEN_LEN: usize = 8;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Random identifier for one process incarnation.
///
/// Format: 8 lowercase base32 characters, e.g. `k3q7ma2x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessToken(String);

impl ProcessToken {
    /// Generate a new token.
    pub fn generate() -> Self {
        ProcessToken(generate_base32(TOKEN_LEN))
    }

    /// Parse an existing token string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != TOKEN_LEN {
            return None;
        }
        if !s.bytes().all(|b| BASE32_ALPHABET.contains(&b)) {
            return None;
        }
        Some(ProcessToken(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProcessToken {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for ProcessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn generate_base32(len: usize) -> String {
    let uuid = uuid::Uuid::new_v4();
    let mut value = u128::from_be_bytes(*uuid.as_bytes());
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = (value & 0x1F) as usize;
        out.push(BASE32_ALPHABET[idx] as char);
        value >>= 5;
    }
    out
}
