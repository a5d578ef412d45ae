//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count handler invocations currently executing
//! - Let shutdown wait until no handler touches the host anymore
//!
//! # Design Decisions
//! - RAII guard: the count is released on every exit path, unwinding included
//! - Guards can be moved into blocking tasks to cover work outliving the handler future

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tracks active handler invocations.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<AtomicU64>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new invocation. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Current number of tracked invocations.
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until every tracked invocation has finished.
    pub async fn wait_idle(&self) {
        while self.active.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }
}

/// Guard that tracks one invocation's lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
