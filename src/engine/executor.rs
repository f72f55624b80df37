//! Redaction executor: runs the decision walk, issues classification calls, and
//! applies verdicts through an effect sink.
//!
//! Calls are issued concurrently up to `max_in_flight`; effects land in completion
//! order. A failed call leaves its node visible and never stops the rest of the scan.

use crate::engine::scan::ScanGeneration;
use crate::engine::thresholds::DecisionThresholds;
use crate::engine::walk::{walk, Action, Reason};
use crate::error::ApiError;
use crate::predicate::RedactionPredicate;
use crate::sink::EffectSink;
use crate::types::{ContentNode, NodeHandle};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Binary content classifier used by the executor.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn should_redact(&self, content: &str) -> Result<bool, ApiError>;
}

#[async_trait]
impl Classifier for RedactionPredicate {
    async fn should_redact(&self, content: &str) -> Result<bool, ApiError> {
        RedactionPredicate::should_redact(self, content).await
    }
}

/// Outcome of one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub generation: u64,
    /// Nodes the walk reached
    pub visited: usize,
    /// Classification calls issued
    pub classified: usize,
    /// Handles passed to the sink, in completion order
    pub redacted: Vec<NodeHandle>,
    /// Calls that failed; their nodes stay visible
    pub failed: usize,
    /// Leaves skipped for exceeding the size guard
    pub oversized: Vec<NodeHandle>,
    /// Results dropped because a newer scan started
    pub stale: usize,
    pub duration_ms: u64,
}

pub struct RedactionExecutor {
    classifier: Arc<dyn Classifier>,
    thresholds: DecisionThresholds,
    max_in_flight: usize,
}

impl RedactionExecutor {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        thresholds: DecisionThresholds,
        max_in_flight: usize,
    ) -> Self {
        Self {
            classifier,
            thresholds,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    pub async fn execute(
        &self,
        root: &ContentNode,
        sink: &dyn EffectSink,
        generation: &ScanGeneration,
    ) -> ScanReport {
        let started = Instant::now();
        let mut report = ScanReport {
            generation: generation.id(),
            ..ScanReport::default()
        };

        let mut targets = Vec::new();
        for decision in walk(root, &self.thresholds) {
            report.visited += 1;
            match decision.reason {
                Reason::OversizedLeaf { len } => {
                    warn!(
                        handle = %decision.node.handle,
                        len,
                        leaf_max_len = self.thresholds.leaf_max_len,
                        "Leaf too large to classify, leaving visible"
                    );
                    report.oversized.push(decision.node.handle.clone());
                }
                _ if decision.action() == Action::Classify => targets.push(decision.node),
                _ => {}
            }
        }
        report.classified = targets.len();
        debug!(
            generation = generation.id(),
            visited = report.visited,
            calls = targets.len(),
            "Planned scan"
        );

        if !generation.is_current() {
            report.stale = targets.len();
            targets.clear();
        }

        // Owned items so the scan future can be spawned.
        let total = targets.len();
        let items: Vec<(NodeHandle, String)> = targets
            .into_iter()
            .map(|node| (node.handle.clone(), node.content.clone()))
            .collect();
        let mut results = stream::iter(items)
            .map(|(handle, content)| {
                let classifier = Arc::clone(&self.classifier);
                async move {
                    let outcome = classifier.should_redact(&content).await;
                    (handle, outcome)
                }
            })
            .buffer_unordered(self.max_in_flight);

        let mut completed = 0;
        while let Some((handle, outcome)) = results.next().await {
            if !generation.is_current() {
                // Dropping the stream cancels in-flight calls and starts no more.
                report.stale += total - completed;
                break;
            }
            completed += 1;
            match outcome {
                Ok(true) => {
                    sink.apply(&handle);
                    report.redacted.push(handle);
                }
                Ok(false) => {}
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        handle = %handle,
                        error = %err,
                        "Classification failed, leaving node visible"
                    );
                }
            }
        }

        if report.stale > 0 {
            warn!(
                generation = generation.id(),
                discarded = report.stale,
                "Discarded results from superseded scan"
            );
        }
        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            generation = report.generation,
            visited = report.visited,
            classified = report.classified,
            redacted = report.redacted.len(),
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Scan completed"
        );
        report
    }
}
