// src/store/memory.rs

//! In-memory novelty store for tests and local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::store::NoveltyStore;

/// Non-durable store keeping markers in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Option<u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of marked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TTL recorded for `key`, if the key is marked.
    pub fn ttl_of(&self, key: &str) -> Option<Option<u64>> {
        self.entries.lock().unwrap().get(key).copied()
    }
}

#[async_trait]
impl NoveltyStore for MemoryStore {
    async fn is_marked(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn mark(&self, key: &str, ttl_secs: Option<u64>) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), ttl_secs);
        Ok(())
    }
}
