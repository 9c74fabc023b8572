//! Duplicate-request suppression for at-most-once delivery.
//!
//! Correlation ids are remembered for a fixed TTL after first sight. A
//! single periodic sweep purges expired entries in one pass; entries are
//! also ignored lazily once past their TTL, so an id becomes reusable
//! exactly when the TTL elapses regardless of sweep timing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// How long a correlation id is held after first sight.
pub const DEDUP_TTL: Duration = Duration::from_secs(300);

/// Cadence of the background purge.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct DedupCache {
    ttl: Duration,
    seen: RwLock<HashMap<Uuid, Instant>>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::with_ttl(DEDUP_TTL)
    }
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the id was seen within the TTL window.
    pub async fn is_duplicate(&self, request_id: Uuid) -> bool {
        match self.seen.read().await.get(&request_id) {
            Some(first_seen) => first_seen.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Records the id's arrival. Re-recording refreshes nothing: the TTL
    /// runs from first sight.
    pub async fn record(&self, request_id: Uuid) {
        self.seen
            .write()
            .await
            .entry(request_id)
            .or_insert_with(Instant::now);
    }

    /// Purges every entry older than the TTL, returning how many went.
    pub async fn sweep(&self) -> usize {
        let mut seen = self.seen.write().await;
        let before = seen.len();
        seen.retain(|_, first_seen| first_seen.elapsed() < self.ttl);
        before - seen.len()
    }

    /// Spawns the periodic sweep task.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = cache.sweep().await;
                if purged > 0 {
                    debug!(purged, "dedup cache swept");
                }
            }
        })
    }
}
