//! Permit gate: bounded concurrency in front of upstream calls.
//!
//! The gate is advisory. A caller that cannot get a permit within the timeout proceeds
//! anyway (and is counted as a bypass), so a misbehaving gate degrades into upstream
//! rate limiting instead of stalled reads.
//!
//! Every [`PermitGate::try_acquire`] returns exactly one [`PermitGuard`]. Dropping the
//! guard (or calling [`PermitGuard::release`]) is the single release for that attempt;
//! a guard that never held a permit gives nothing back, so the pool can neither leak nor
//! grow past its limit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Snapshot of gate usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    pub limit: usize,
    pub outstanding: usize,
    pub bypassed: u64,
}

/// Process-wide pool of upstream permits, shared by cloning.
#[derive(Debug, Clone)]
pub struct PermitGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    timeout: Duration,
    bypassed: Arc<AtomicU64>,
}

impl PermitGate {
    pub fn new(limit: usize, timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            timeout,
            bypassed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait up to the configured timeout for a permit.
    pub async fn acquire(&self, operation: &str) -> PermitGuard {
        self.try_acquire(operation, self.timeout).await
    }

    /// Wait up to `timeout` for a permit. The guard reports whether one was obtained.
    pub async fn try_acquire(&self, operation: &str, timeout: Duration) -> PermitGuard {
        debug!(operation, "attempting to acquire upstream permit");

        let permit = match tokio::time::timeout(
            timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => {
                debug!(operation, "upstream permit acquired");
                Some(permit)
            }
            Ok(Err(_closed)) => {
                warn!(operation, "permit gate closed; proceeding without permit");
                self.bypassed.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(_elapsed) => {
                warn!(
                    operation,
                    timeout_ms = timeout.as_millis() as u64,
                    "could not acquire upstream permit in time; proceeding anyway"
                );
                self.bypassed.fetch_add(1, Ordering::Relaxed);
                None
            }
        };

        PermitGuard {
            permit,
            operation: operation.to_string(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits currently held.
    pub fn outstanding(&self) -> usize {
        self.limit.saturating_sub(self.semaphore.available_permits())
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            limit: self.limit,
            outstanding: self.outstanding(),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of one acquisition attempt; releases on drop.
#[derive(Debug)]
#[must_use = "dropping the guard releases the permit immediately"]
pub struct PermitGuard {
    permit: Option<OwnedSemaphorePermit>,
    operation: String,
}

impl PermitGuard {
    pub fn is_acquired(&self) -> bool {
        self.permit.is_some()
    }

    /// Release explicitly. Equivalent to dropping the guard.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        if self.permit.take().is_some() {
            debug!(operation = %self.operation, "upstream permit released");
        }
    }
}
