//! Record store gateway: a thin client for a Cloudflare D1-style HTTP query
//! endpoint, plus an in-process dedup cache keyed by post id.
//!
//! Writes are insert-only and at-most-once: no retries, no rollback. A failed
//! remote write after a successful channel publish leaves the two views
//! inconsistent by design; callers surface the error to the operator instead
//! of reconciling.

pub mod client;
pub mod config;
pub mod error;
pub mod record;

pub use {
    client::{D1Client, SaveOutcome},
    config::StoreConfig,
    error::{Error, Result},
    record::{ImageRecord, manual_post_id},
};
