//! Telemetry spool core library.
//!
//! A durable, bounded, disk-backed overflow queue for telemetry
//! transmissions that could not be sent right away:
//! - Record codec with an allow-list of decodable record kinds
//! - Directory store with a stage → commit write protocol and a byte budget
//! - Oldest-file cache that hands each committed file to exactly one consumer
//! - Metrics sink and structured logging setup
//!
//! The `spoolctl` binary entry point is in `main.rs`.

pub mod cache;
pub mod codec;
pub mod exit_codes;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod transmission;

pub use cache::{Claim, OldestFileCache};
pub use codec::RecordKind;
pub use metrics::{FailureStats, MetricsSink};
pub use retry::{RetryExhausted, RetryPolicy};
pub use store::{DirectoryStore, OverflowQueue, SpoolStatus, StoreConfig, SweptFile};
pub use transmission::Transmission;

pub use spool_common::{Error, ErrorCategory, ProcessToken, Result};
pub use spool_config::RefillOrder;

/// Bytes per megabyte for capacity arithmetic.
pub const BYTES_PER_MB: u64 = 1024 * 1024;
