//! Policy Fold Queue
//!
//! Multi-producer, single-consumer queue that folds flagged samples into the policy
//! document one at a time. A fold reads the whole policy and replaces it, so two folds
//! running together would silently lose one sample's contribution: the queue never runs
//! more than one worker.

use crate::error::ApiError;
use crate::policy::prompt::{build_fold_prompt, parse_fenced_policy};
use crate::policy::store::PolicyStore;
use crate::provider::{ChatMessage, CompletionClient};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// `[fold]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldConfig {
    /// Completion attempts per sample before it is abandoned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Delay between attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl FoldConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoldStats {
    /// Samples waiting for a fold
    pub pending: usize,
    /// Samples folded into the policy
    pub folded: usize,
    /// Samples dropped after exhausting their attempts
    pub abandoned: usize,
}

struct QueueState {
    pending: VecDeque<String>,
    active: bool,
}

/// Serialized policy fold queue
pub struct FoldQueue {
    /// Pending samples and the active-worker flag, guarded together so the
    /// worker's "queue empty, exit" and a producer's "worker active, just append"
    /// can never interleave.
    state: Mutex<QueueState>,
    client: Arc<dyn CompletionClient>,
    store: Arc<PolicyStore>,
    model: String,
    config: FoldConfig,
    stats: RwLock<FoldStats>,
    /// Training-in-progress flag for observers
    training: watch::Sender<bool>,
}

impl FoldQueue {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<PolicyStore>,
        model: impl Into<String>,
        config: FoldConfig,
    ) -> Arc<Self> {
        let (training, _) = watch::channel(false);
        Arc::new(Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                active: false,
            }),
            client,
            store,
            model: model.into(),
            config,
            stats: RwLock::new(FoldStats::default()),
            training,
        })
    }

    /// Append a sample. Starts the worker when none is running; otherwise the
    /// running worker picks the sample up. Returns whether a worker was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(self: &Arc<Self>, sample: impl Into<String>) -> bool {
        let sample = sample.into();
        let start_worker = {
            let mut state = self.state.lock();
            state.pending.push_back(sample);
            self.stats.write().pending += 1;
            let start = !state.active;
            if start {
                state.active = true;
                self.training.send_replace(true);
            }
            debug!(
                queue_size = state.pending.len(),
                start_worker = start,
                "Enqueued policy sample"
            );
            start
        };

        if start_worker {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.run().await });
        }
        start_worker
    }

    /// True while a worker is draining the queue.
    pub fn is_training(&self) -> bool {
        *self.training.borrow()
    }

    /// Observe the training flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.training.subscribe()
    }

    pub fn stats(&self) -> FoldStats {
        self.stats.read().clone()
    }

    /// Wait until the worker has drained the queue.
    pub async fn wait_for_idle(&self, timeout: Option<Duration>) -> Result<(), ApiError> {
        let mut rx = self.training.subscribe();
        let idle = async move {
            while *rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        };
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, idle).await.map_err(|_| {
                ApiError::ConfigError("Timeout waiting for policy folds to finish".to_string())
            }),
            None => {
                idle.await;
                Ok(())
            }
        }
    }

    async fn run(self: Arc<Self>) {
        info!("Policy fold worker started");
        loop {
            let sample = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(sample) => sample,
                    None => {
                        state.active = false;
                        self.training.send_replace(false);
                        break;
                    }
                }
            };
            {
                let mut stats = self.stats.write();
                stats.pending = stats.pending.saturating_sub(1);
            }

            let started = Instant::now();
            match self.fold(&sample).await {
                Ok(policy) => {
                    self.stats.write().folded += 1;
                    info!(
                        policy_len = policy.chars().count(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Policy updated from flagged sample"
                    );
                }
                Err(err) => {
                    self.stats.write().abandoned += 1;
                    warn!(
                        error = %err,
                        sample_len = sample.chars().count(),
                        "Abandoned flagged sample"
                    );
                }
            }
        }
        info!("Policy fold worker drained queue");
    }

    /// Fold one sample into the policy and persist the result.
    ///
    /// Malformed responses and transport failures are retried up to
    /// `max_attempts` in total; configuration errors are returned immediately.
    pub async fn fold(&self, sample: &str) -> Result<String, ApiError> {
        let current = self.store.effective();
        let messages = vec![ChatMessage::user(build_fold_prompt(&current, sample))];

        let mut last_error = None;
        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 && self.config.retry_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }
            let response = match self.client.complete(messages.clone(), &self.model).await {
                Ok(response) => response,
                Err(err) if err.is_config() => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "Policy fold request failed");
                    last_error = Some(err);
                    continue;
                }
            };
            match parse_fenced_policy(&response) {
                Ok(policy) => {
                    self.store.write(&policy)?;
                    return Ok(policy);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Malformed policy fold response");
                    last_error = Some(err.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ApiError::ConfigError("fold.max_attempts must be at least 1".to_string())
        }))
    }
}
