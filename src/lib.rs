//! veil: policy-driven content redaction
//!
//! Walks accessibility-style content trees, asks a language model whether each
//! qualifying subtree violates the moderation policy, and redacts through an effect
//! sink. Flagged samples are folded into the policy one at a time by a serialized queue.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod policy;
pub mod predicate;
pub mod provider;
pub mod selection;
pub mod sink;
pub mod tooling;
pub mod types;
