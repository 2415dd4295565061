// src/pipeline/monitor.rs

//! Long-lived monitoring loop and startup store connection.

use std::time::Duration;

use log::{error, info};

use crate::error::{AppError, Result};
use crate::pipeline::Watcher;
use crate::store::RedisStore;

/// Startup connection attempts before giving up.
pub const CONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between startup connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connect to the novelty store with the bounded startup retry budget.
///
/// Exhausting the budget is fatal; the caller exits non-zero.
pub async fn connect_store(url: &str) -> Result<RedisStore> {
    connect_store_with(url, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY).await
}

/// Connect with an explicit retry budget and delay.
pub async fn connect_store_with(url: &str, attempts: u32, delay: Duration) -> Result<RedisStore> {
    for attempt in 1..=attempts {
        match RedisStore::connect(url).await {
            Ok(store) => {
                info!("Store connection established");
                return Ok(store);
            }
            Err(e) => {
                error!("Store connection failed (attempt {attempt}/{attempts}): {e}");
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(AppError::StoreUnavailable { attempts })
}

/// Drive poll cycles forever on a fixed interval.
///
/// The interval is measured from the end of one cycle to the start of the
/// next, not wall-clock aligned. Errors inside a cycle are contained by
/// the cycle itself; this loop never aborts.
pub async fn run_monitor(watcher: &Watcher, interval: Duration) -> Result<()> {
    info!(
        "Monitoring started, checking every {} seconds",
        interval.as_secs()
    );

    loop {
        let outcome = watcher.run_cycle().await;
        if outcome.failures > 0 {
            error!("Cycle finished with {} contained failures", outcome.failures);
        }
        info!("Next check in {} seconds", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}
