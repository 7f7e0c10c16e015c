//! Scheduled cache reset.
//!
//! A blunt invalidation: every tick clears the whole cache, whether or not anything
//! has expired, so staleness is bounded by the schedule rather than by TTL alone.

use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::RecordCache;

/// When the cache is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheResetSchedule {
    /// Every day at 00:00 UTC.
    Daily,
    /// At a fixed interval, first reset one interval after start.
    Every(Duration),
}

impl CacheResetSchedule {
    /// Delay from `now` until the next reset.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Daily => until_next_midnight(now),
            Self::Every(interval) => *interval,
        }
    }
}

/// Time remaining until the next 00:00 UTC (a full day when `now` is exactly midnight).
pub fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc());

    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(24 * 60 * 60)),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

/// Handle to a running reset loop; the loop stops when the handle is shut down or dropped.
#[derive(Debug)]
pub struct CacheResetTask {
    handle: JoinHandle<()>,
}

impl CacheResetTask {
    pub fn shutdown(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CacheResetTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the reset loop on the current tokio runtime.
pub fn spawn_cache_reset(cache: RecordCache, schedule: CacheResetSchedule) -> CacheResetTask {
    info!(schedule = ?schedule, "scheduling employee cache reset");

    let handle = tokio::spawn(async move {
        loop {
            let delay = schedule.next_delay(Utc::now());
            debug!(delay_secs = delay.as_secs(), "next cache reset scheduled");
            tokio::time::sleep(delay).await;

            info!("clearing employee cache (scheduled)");
            cache.evict_all();
        }
    });

    CacheResetTask { handle }
}
