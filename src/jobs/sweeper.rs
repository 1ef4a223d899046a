//! Background job: sweep expired cache entries.
//!
//! Reads are already TTL-checked, so this sweep is purely about
//! reclaiming memory from abandoned scenes nobody polls again.

use std::time::Duration;
use tokio::time;

use crate::cache::TtlCache;

/// Spawn the background sweep task. Call this once at startup.
pub fn spawn(cache: TtlCache) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = cache.len(), "swept expired cache entries");
            }
        }
    });
}
