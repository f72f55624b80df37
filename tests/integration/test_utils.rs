//! Shared test utilities for integration tests
//!
//! Scripted completion clients, content-tree builders, and isolated environment
//! setup for configuration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tempfile::TempDir;
use veil::error::ApiError;
use veil::provider::{ChatMessage, CompletionClient};
use veil::types::{ContentNode, NodeHandle};

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: StdMutex<()> = StdMutex::new(());

const ENV_KEYS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "VEIL_ENV",
    "VEIL_API_KEY",
    "VEIL_PROVIDER__API_KEY",
    "VEIL_PROVIDER__CLASSIFY_MODEL",
    "VEIL_SCAN__MAX_IN_FLIGHT",
];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            ENV_KEYS
                .iter()
                .map(|key| (*key, std::env::var(key).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (key, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and every
/// `VEIL_*` variable the tests touch cleared; the environment is restored after.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_config_home).unwrap();

    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);

    let result = f();

    env_state.restore();
    result
}

/// Completion client that replays scripted responses and records every request.
///
/// Falls back to `FORWARD` once the script runs out.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, ApiError>>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn replying(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Hold each call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, String)> {
        self.calls.lock().clone()
    }

    /// User turns of every request, in call order.
    pub fn user_turns(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|(messages, _)| messages.last().map(|m| m.content.clone()))
            .collect()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().push((messages, model.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("FORWARD".to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Leaf with `len` characters of filler text.
pub fn leaf(handle: &str, len: usize) -> ContentNode {
    ContentNode::new("p", filler(handle, len), NodeHandle::new(handle))
}

/// Node with `len` characters of own content and the given children.
pub fn parent(handle: &str, len: usize, children: Vec<ContentNode>) -> ContentNode {
    ContentNode::new("section", filler(handle, len), NodeHandle::new(handle))
        .with_children(children)
}

/// Deterministic text of exactly `len` characters that starts with `tag`
/// when there is room for it.
pub fn filler(tag: &str, len: usize) -> String {
    let mut text: String = format!("{} ", tag).chars().take(len).collect();
    while text.chars().count() < len {
        text.push('x');
    }
    text
}
