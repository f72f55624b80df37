//! Scan generations and trigger debouncing.
//!
//! Every rescan takes a fresh [`ScanGeneration`] from the coordinator; starting a
//! new scan makes all earlier tokens stale, and the executor discards results that
//! complete under a stale token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Issues scan generation tokens
#[derive(Debug, Clone, Default)]
pub struct ScanCoordinator {
    latest: Arc<AtomicU64>,
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating every earlier token.
    pub fn begin(&self) -> ScanGeneration {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        ScanGeneration {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Token for one traversal of one tree
#[derive(Debug, Clone)]
pub struct ScanGeneration {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl ScanGeneration {
    /// A token that never goes stale, for one-shot scans.
    pub fn detached() -> Self {
        ScanCoordinator::new().begin()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

/// Coalesces bursts of triggers into one batch after a quiet window.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    quiet: Duration,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet }
    }

    /// Wait for the next trigger, then keep collecting until no trigger has
    /// arrived for the quiet window. Returns `None` once the channel is closed
    /// and drained.
    pub async fn next_batch<T>(&self, rx: &mut mpsc::Receiver<T>) -> Option<Vec<T>> {
        let first = rx.recv().await?;
        let mut batch = vec![first];
        loop {
            match tokio::time::timeout(self.quiet, rx.recv()).await {
                Ok(Some(item)) => batch.push(item),
                Ok(None) | Err(_) => break,
            }
        }
        Some(batch)
    }
}
