//! Long-running integrations around the redaction engine.

pub mod watch;

pub use watch::{ChangeEvent, WatchConfig, WatchDaemon};
