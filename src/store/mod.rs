// src/store/mod.rs

//! Novelty store abstractions.
//!
//! The store is a durable mapping from identity keys to "sent" markers.
//! Show keys are permanent; heartbeat keys carry a 60-day expiry so the
//! store self-prunes. The production backend is Redis; an in-memory
//! backend serves as the test double.
//!
//! No read-modify-write atomicity is provided: a show can in principle be
//! notified twice if marking fails after a dispatch (accepted
//! at-least-once semantics).

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Marker value written for every key.
pub const MARKER: &str = "sent";

/// Durable key-marker store used to remember already-notified keys.
#[async_trait]
pub trait NoveltyStore: Send + Sync {
    /// True iff a prior write exists for `key`.
    ///
    /// An absent key is `Ok(false)`, never an error; only connectivity
    /// failures raise, and callers treat those as non-fatal per-cycle
    /// errors.
    async fn is_marked(&self, key: &str) -> Result<bool>;

    /// Write the marker for `key`, idempotently.
    ///
    /// `ttl_secs` is `None` for show keys (permanent) and set for
    /// heartbeat keys.
    async fn mark(&self, key: &str, ttl_secs: Option<u64>) -> Result<()>;
}
