//! Redaction Decision Engine
//!
//! A pure decision walk over the content tree plus an executor that turns
//! `Classify` decisions into classification calls and sink effects.

pub mod executor;
pub mod scan;
pub mod thresholds;
pub mod walk;

pub use executor::{Classifier, RedactionExecutor, ScanReport};
pub use scan::{Debouncer, ScanCoordinator, ScanGeneration};
pub use thresholds::DecisionThresholds;
pub use walk::{decide, population_variance, walk, Action, Decision, DecisionWalk, Reason};
