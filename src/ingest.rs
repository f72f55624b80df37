//! Flag ingestion: user-flagged text goes to the durable history and the fold queue.

use crate::error::ApiError;
use crate::policy::{FlagHistory, FoldQueue};
use std::sync::Arc;
use tracing::{debug, info};

/// Samples must be longer than this (trimmed, in chars) to be kept in history.
pub const HISTORY_MIN_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagOutcome {
    /// Appended to the flagged-sample history
    pub recorded: bool,
    /// Handed to the fold queue
    pub enqueued: bool,
}

pub struct FlagIngestor {
    history: Arc<FlagHistory>,
    queue: Arc<FoldQueue>,
}

impl FlagIngestor {
    pub fn new(history: Arc<FlagHistory>, queue: Arc<FoldQueue>) -> Self {
        Self { history, queue }
    }

    /// Record and enqueue a flagged selection.
    ///
    /// Blank content is ignored. Content longer than [`HISTORY_MIN_LEN`] after
    /// trimming is appended to history before it is enqueued; shorter content is
    /// only enqueued. Must be called from within a tokio runtime.
    pub fn flag(&self, content: &str) -> Result<FlagOutcome, ApiError> {
        let trimmed_len = content.trim().chars().count();
        if trimmed_len == 0 {
            debug!("Ignoring blank flagged selection");
            return Ok(FlagOutcome::default());
        }

        let recorded = trimmed_len > HISTORY_MIN_LEN;
        if recorded {
            self.history.append(content)?;
        }
        let started_worker = self.queue.enqueue(content);
        info!(
            len = trimmed_len,
            recorded,
            started_worker,
            "Flagged sample accepted"
        );
        Ok(FlagOutcome {
            recorded,
            enqueued: true,
        })
    }
}
