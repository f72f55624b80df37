//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, PolicyCommands};
use crate::cli::presentation::{
    format_flag_result, format_history_json, format_history_text, format_plan_json,
    format_plan_text, format_policy_text, format_scan_json, format_scan_text, format_status_json,
    format_status_text, StatusReport,
};
use crate::config::{ConfigLoader, VeilConfig};
use crate::engine::{walk, Classifier, RedactionExecutor, ScanGeneration};
use crate::error::ApiError;
use crate::ingest::FlagIngestor;
use crate::policy::{open_state, FlagHistory, FoldQueue, PolicyStore};
use crate::predicate::RedactionPredicate;
use crate::provider::{CompletionClient, HttpCompletionClient};
use crate::selection::{parse_rect, selected_content};
use crate::sink::{ConsoleSink, RecordingSink};
use crate::tooling::{WatchConfig, WatchDaemon};
use crate::types::ContentNode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info_span;

use crate::cli::command_name;

/// Opened state database handles
struct State {
    policy: Arc<PolicyStore>,
    history: Arc<FlagHistory>,
}

/// Runtime context for CLI execution: workspace, loaded config, and lazily opened services.
pub struct RunContext {
    workspace_root: PathBuf,
    config: VeilConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: VeilConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &VeilConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let span = info_span!("command", name = %command_name(command));
        let _entered = span.enter();
        match command {
            Commands::Plan { snapshot, format } => self.plan(snapshot, format),
            Commands::Scan { snapshot, format } => self.scan(snapshot, format),
            Commands::Watch {
                snapshot,
                debounce_ms,
            } => self.watch(snapshot, *debounce_ms),
            Commands::Select {
                snapshot,
                rect,
                flag,
            } => self.select(snapshot, rect, *flag),
            Commands::Flag { text } => self.flag(text),
            Commands::Policy { command } => self.handle_policy_command(command),
            Commands::History { limit, format } => self.history(*limit, format),
            Commands::Status { format } => self.status(format),
            Commands::Config => toml::to_string_pretty(&self.config.redacted())
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn load_snapshot(&self, path: &Path) -> Result<ContentNode, ApiError> {
        Ok(ContentNode::load(&self.resolve(path))?)
    }

    fn open_state(&self) -> Result<State, ApiError> {
        let path = self.config.state_path(&self.workspace_root);
        std::fs::create_dir_all(&path).map_err(|e| ApiError::StorageError(e.into()))?;
        let (policy, history) = open_state(&path, &self.config.policy)?;
        Ok(State {
            policy: Arc::new(policy),
            history: Arc::new(history),
        })
    }

    fn client(&self) -> Result<Arc<dyn CompletionClient>, ApiError> {
        Ok(Arc::new(HttpCompletionClient::new(&self.config.provider)?))
    }

    fn executor(&self, state: &State) -> Result<Arc<RedactionExecutor>, ApiError> {
        let predicate: Arc<dyn Classifier> = Arc::new(RedactionPredicate::new(
            self.client()?,
            Arc::clone(&state.policy),
            self.config.provider.classify_model.clone(),
        ));
        Ok(Arc::new(RedactionExecutor::new(
            predicate,
            self.config.thresholds.clone(),
            self.config.scan.max_in_flight,
        )))
    }

    fn fold_queue(&self, state: &State) -> Result<Arc<FoldQueue>, ApiError> {
        Ok(FoldQueue::new(
            self.client()?,
            Arc::clone(&state.policy),
            self.config.provider.policy_model.clone(),
            self.config.fold.clone(),
        ))
    }

    fn runtime() -> Result<Runtime, ApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to start async runtime: {}", e)))
    }

    fn plan(&self, snapshot: &Path, format: &str) -> Result<String, ApiError> {
        let tree = self.load_snapshot(snapshot)?;
        let decisions: Vec<_> = walk(&tree, &self.config.thresholds).collect();
        Ok(match format {
            "json" => format_plan_json(&decisions),
            _ => format_plan_text(&decisions),
        })
    }

    fn scan(&self, snapshot: &Path, format: &str) -> Result<String, ApiError> {
        let tree = self.load_snapshot(snapshot)?;
        let state = self.open_state()?;
        let executor = self.executor(&state)?;
        let sink = RecordingSink::new();
        let report = Self::runtime()?.block_on(executor.execute(
            &tree,
            &sink,
            &ScanGeneration::detached(),
        ));

        if format == "json" {
            return Ok(format_scan_json(&report));
        }
        let mut content_by_handle = HashMap::new();
        let mut stack = vec![&tree];
        while let Some(node) = stack.pop() {
            content_by_handle.insert(&node.handle, node.content.as_str());
            stack.extend(node.children.iter());
        }
        let snippets: Vec<(String, String)> = report
            .redacted
            .iter()
            .map(|handle| {
                (
                    handle.to_string(),
                    content_by_handle
                        .get(handle)
                        .map(|content| content.to_string())
                        .unwrap_or_default(),
                )
            })
            .collect();
        Ok(format_scan_text(&report, &snippets))
    }

    fn watch(&self, snapshot: &Path, debounce_ms: Option<u64>) -> Result<String, ApiError> {
        let state = self.open_state()?;
        let executor = self.executor(&state)?;
        let config = WatchConfig::new(
            self.resolve(snapshot),
            debounce_ms.unwrap_or(self.config.scan.debounce_ms),
        );
        let daemon = WatchDaemon::new(executor, Arc::new(ConsoleSink::new(true)), config);
        Self::runtime()?.block_on(daemon.run())?;
        Ok("Watch stopped.".to_string())
    }

    fn select(&self, snapshot: &Path, rect: &str, flag: bool) -> Result<String, ApiError> {
        let tree = self.load_snapshot(snapshot)?;
        let rect = parse_rect(rect).map_err(ApiError::ConfigError)?;
        let content = selected_content(&tree, &rect);
        if !flag {
            return Ok(content);
        }
        let flagged = self.flag(&content)?;
        Ok(format!("{}\n\n{}", content, flagged))
    }

    fn flag(&self, text: &str) -> Result<String, ApiError> {
        let state = self.open_state()?;
        let queue = self.fold_queue(&state)?;
        let ingestor = FlagIngestor::new(Arc::clone(&state.history), Arc::clone(&queue));
        let outcome = Self::runtime()?.block_on(async {
            let outcome = ingestor.flag(text)?;
            queue.wait_for_idle(None).await?;
            Ok::<_, ApiError>(outcome)
        })?;
        Ok(format_flag_result(
            &outcome,
            &queue.stats(),
            &state.policy.effective(),
        ))
    }

    fn handle_policy_command(&self, command: &PolicyCommands) -> Result<String, ApiError> {
        let state = self.open_state()?;
        match command {
            PolicyCommands::Show => Ok(format_policy_text(
                &state.policy.effective(),
                state.policy.is_default(),
            )),
            PolicyCommands::Set { text } => {
                let text = text.trim();
                if text.chars().count() < self.config.policy.min_len {
                    return Err(ApiError::ConfigError(format!(
                        "Policy must be at least {} characters",
                        self.config.policy.min_len
                    )));
                }
                state.policy.write(text)?;
                Ok(format_policy_text(text, false))
            }
            PolicyCommands::Reset => {
                state.policy.clear()?;
                Ok(format_policy_text(&state.policy.effective(), true))
            }
        }
    }

    fn history(&self, limit: Option<usize>, format: &str) -> Result<String, ApiError> {
        let state = self.open_state()?;
        let mut samples = state.history.list()?;
        if let Some(limit) = limit {
            let skip = samples.len().saturating_sub(limit);
            samples.drain(..skip);
        }
        Ok(match format {
            "json" => format_history_json(&samples),
            _ => format_history_text(&samples),
        })
    }

    fn status(&self, format: &str) -> Result<String, ApiError> {
        let state = self.open_state()?;
        let status = StatusReport {
            policy_chars: state.policy.effective().chars().count(),
            policy_is_default: state.policy.is_default(),
            flagged_samples: state.history.len(),
            api_url: self.config.provider.api_url.clone(),
            api_key_configured: self.config.provider.has_api_key(),
            classify_model: self.config.provider.classify_model.clone(),
            policy_model: self.config.provider.policy_model.clone(),
            state_path: self
                .config
                .state_path(&self.workspace_root)
                .display()
                .to_string(),
        };
        Ok(match format {
            "json" => format_status_json(&status),
            _ => format_status_text(&status),
        })
    }
}
