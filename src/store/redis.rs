// src/store/redis.rs

//! Redis-backed novelty store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use crate::error::Result;
use crate::store::{MARKER, NoveltyStore};

/// Reconnect backoff cap, in milliseconds.
const RECONNECT_MAX_DELAY_MS: u64 = 10_000;

/// Reconnect attempts before the manager reports permanent failure.
const RECONNECT_RETRIES: usize = 10;

/// Novelty store backed by a Redis server.
///
/// The connection manager transparently reconnects with increasing delay
/// capped at 10 seconds; this is distinct from the orchestrator's own
/// bounded startup-connect retry loop.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_factor(1_000)
            .set_max_delay(RECONNECT_MAX_DELAY_MS)
            .set_number_of_retries(RECONNECT_RETRIES);
        let conn = client.get_connection_manager_with_config(config).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl NoveltyStore for RedisStore {
    async fn is_marked(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value.is_some())
    }

    async fn mark(&self, key: &str, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(key, MARKER, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, MARKER).await?;
            }
        }
        Ok(())
    }
}
