//! Watch Mode Daemon
//!
//! Watches a content-tree snapshot file and rescans it whenever it changes. Bursts of
//! filesystem events are debounced into one rescan; each rescan runs under a fresh scan
//! generation so results from a superseded tree are discarded, and handles redacted by
//! an older tree that the newest completed scan no longer redacts are reverted.

use crate::engine::{Debouncer, RedactionExecutor, ScanCoordinator, ScanReport};
use crate::error::{ApiError, StorageError};
use crate::sink::{EffectSink, RecordingSink, TeeSink};
use crate::types::{ContentNode, NodeHandle};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watch mode configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Snapshot file to watch
    pub snapshot_path: PathBuf,
    /// Quiet window before a rescan (milliseconds)
    pub debounce_ms: u64,
    /// Pending change notifications kept before new ones are dropped
    pub max_queue_size: usize,
}

impl WatchConfig {
    pub fn new(snapshot_path: PathBuf, debounce_ms: u64) -> Self {
        Self {
            snapshot_path,
            debounce_ms,
            max_queue_size: 1024,
        }
    }
}

/// Kind of change seen on the snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Written,
    Removed,
}

/// Watch mode daemon
pub struct WatchDaemon {
    executor: Arc<RedactionExecutor>,
    sink: Arc<dyn EffectSink>,
    /// Handles currently redacted through `sink`, across all generations
    ledger: Arc<RecordingSink>,
    coordinator: ScanCoordinator,
    config: WatchConfig,
}

impl WatchDaemon {
    pub fn new(
        executor: Arc<RedactionExecutor>,
        sink: Arc<dyn EffectSink>,
        config: WatchConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            executor,
            sink,
            ledger: Arc::new(RecordingSink::new()),
            coordinator: ScanCoordinator::new(),
            config,
        })
    }

    /// Handles currently redacted.
    pub fn redacted(&self) -> Vec<NodeHandle> {
        self.ledger.active()
    }

    /// Scan `tree` as the newest generation.
    ///
    /// Returns `None` when a newer scan started before this one finished; its
    /// late results were discarded and reconciliation is left to the newer scan.
    pub async fn scan_tree(self: Arc<Self>, tree: ContentNode) -> Option<ScanReport> {
        let generation = self.coordinator.begin();
        let tee = TeeSink::new(self.sink.as_ref(), self.ledger.as_ref());
        let report = self.executor.execute(&tree, &tee, &generation).await;

        if !generation.is_current() {
            debug!(generation = generation.id(), "Scan superseded");
            return None;
        }
        let keep: HashSet<&NodeHandle> = report.redacted.iter().collect();
        for handle in self.ledger.active() {
            if !keep.contains(&handle) {
                tee.revert(&handle);
            }
        }
        Some(report)
    }

    /// Run until the file watcher goes away.
    pub async fn run(self: Arc<Self>) -> Result<(), ApiError> {
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(self.config.max_queue_size.max(1));
        let watched_name = self
            .config
            .snapshot_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Snapshot path has no file name: {}",
                    self.config.snapshot_path.display()
                ))
            })?;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let touches_snapshot = event
                    .paths
                    .iter()
                    .any(|path| path.file_name() == Some(watched_name.as_os_str()));
                if let (true, Some(change)) = (touches_snapshot, convert_event(&event)) {
                    // A full channel already holds a pending rescan.
                    let _ = tx.try_send(change);
                }
            }
            Err(e) => warn!("Watch error: {}", e),
        })
        .map_err(|e| watch_error("Failed to create watcher", e))?;

        // Watch the directory: editors often replace the file instead of writing in place.
        let watch_dir = parent_dir(&self.config.snapshot_path);
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error("Failed to watch directory", e))?;
        info!(snapshot = %self.config.snapshot_path.display(), "Watching snapshot");

        self.rescan();

        let debouncer = Debouncer::new(Duration::from_millis(self.config.debounce_ms));
        while let Some(batch) = debouncer.next_batch(&mut rx).await {
            if batch.iter().all(|change| *change == ChangeEvent::Removed) {
                info!("Snapshot removed, keeping current redactions");
                continue;
            }
            info!(event_count = batch.len(), "Snapshot changed");
            self.rescan();
        }

        error!("Watcher channel disconnected");
        Ok(())
    }

    /// Load the snapshot and start a scan without waiting for it.
    fn rescan(self: &Arc<Self>) {
        let tree = match ContentNode::load(&self.config.snapshot_path) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "Skipping rescan, snapshot unreadable");
                return;
            }
        };
        let daemon = Arc::clone(self);
        tokio::spawn(async move {
            if let Some(report) = daemon.scan_tree(tree).await {
                info!(
                    generation = report.generation,
                    redacted = report.redacted.len(),
                    "Rescan applied"
                );
            }
        });
    }
}

fn convert_event(event: &Event) -> Option<ChangeEvent> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(ChangeEvent::Written),
        EventKind::Remove(_) => Some(ChangeEvent::Removed),
        _ => None,
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn watch_error(context: &str, err: notify::Error) -> ApiError {
    ApiError::StorageError(StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {}", context, err),
    )))
}
