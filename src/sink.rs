//! Effect sinks: where redaction decisions land.

use crate::types::NodeHandle;
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::io::Write;

/// Applies and reverses the visual treatment for a node.
pub trait EffectSink: Send + Sync {
    fn apply(&self, handle: &NodeHandle);

    fn revert(&self, handle: &NodeHandle);
}

/// Prints redactions to stdout.
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn emit(&self, line: String) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        // Broken pipes are not worth failing a scan over.
        let _ = writeln!(out, "{}", line);
    }
}

impl EffectSink for ConsoleSink {
    fn apply(&self, handle: &NodeHandle) {
        if self.color {
            self.emit(format!("{} {}", "redact".red().bold(), handle));
        } else {
            self.emit(format!("redact {}", handle));
        }
    }

    fn revert(&self, handle: &NodeHandle) {
        if self.color {
            self.emit(format!("{} {}", "reveal".green(), handle));
        } else {
            self.emit(format!("reveal {}", handle));
        }
    }
}

/// Keeps the set of currently redacted handles in memory.
#[derive(Default)]
pub struct RecordingSink {
    active: Mutex<BTreeSet<NodeHandle>>,
    applied: Mutex<Vec<NodeHandle>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently redacted, sorted.
    pub fn active(&self) -> Vec<NodeHandle> {
        self.active.lock().iter().cloned().collect()
    }

    /// Every `apply` call in arrival order.
    pub fn applied(&self) -> Vec<NodeHandle> {
        self.applied.lock().clone()
    }

    pub fn is_redacted(&self, handle: &NodeHandle) -> bool {
        self.active.lock().contains(handle)
    }
}

impl EffectSink for RecordingSink {
    fn apply(&self, handle: &NodeHandle) {
        self.applied.lock().push(handle.clone());
        self.active.lock().insert(handle.clone());
    }

    fn revert(&self, handle: &NodeHandle) {
        self.active.lock().remove(handle);
    }
}

/// Forwards every effect to two sinks.
pub struct TeeSink<'a> {
    first: &'a dyn EffectSink,
    second: &'a dyn EffectSink,
}

impl<'a> TeeSink<'a> {
    pub fn new(first: &'a dyn EffectSink, second: &'a dyn EffectSink) -> Self {
        Self { first, second }
    }
}

impl EffectSink for TeeSink<'_> {
    fn apply(&self, handle: &NodeHandle) {
        self.first.apply(handle);
        self.second.apply(handle);
    }

    fn revert(&self, handle: &NodeHandle) {
        self.first.revert(handle);
        self.second.revert(handle);
    }
}
