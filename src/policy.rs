//! Policy domain: the evolving moderation policy, its durable storage, and the
//! serialized fold queue that rewrites it from flagged samples.

pub mod prompt;
pub mod queue;
pub mod store;

pub use prompt::{build_fold_prompt, parse_fenced_policy, DEFAULT_POLICY};
pub use queue::{FoldConfig, FoldQueue, FoldStats};
pub use store::{open_state, FlagHistory, FlaggedSample, PolicyConfig, PolicyStore};
