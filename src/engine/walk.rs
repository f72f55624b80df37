//! Pure decision walk over a content tree.
//!
//! [`decide`] evaluates one node; [`DecisionWalk`] applies it depth-first, pre-order,
//! descending only where the decision says to. Nothing here issues calls or touches
//! handles, so the policy can be exercised without a network or a sink.

use crate::engine::thresholds::DecisionThresholds;
use crate::types::ContentNode;
use serde::Serialize;

/// What the executor does with a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Nothing, and nothing below it
    Ignore,
    /// One classification call on the node's content; redact on DROP
    Classify,
    /// Evaluate each child with the same policy
    Recurse,
}

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Reason {
    /// Childless node above `leaf_max_len`; reported, never classified
    OversizedLeaf { len: usize },
    /// Node above `leaf_max_len` with children; children are visited unconditionally
    OversizedContainer { len: usize },
    /// Below `min_len`; the subtree is treated as noise
    TooShort { len: usize },
    /// Small enough to classify whole
    Unit { len: usize },
    /// Large node whose children have similar lengths
    Homogeneous { len: usize, variance: f64 },
    /// Large node whose children vary too much; classified whole
    Heterogeneous { len: usize, variance: f64 },
    /// Large node with nothing to split into; classified whole
    Childless { len: usize },
}

impl Reason {
    pub fn action(&self) -> Action {
        match self {
            Reason::OversizedLeaf { .. } | Reason::TooShort { .. } => Action::Ignore,
            Reason::Unit { .. } | Reason::Heterogeneous { .. } | Reason::Childless { .. } => {
                Action::Classify
            }
            Reason::OversizedContainer { .. } | Reason::Homogeneous { .. } => Action::Recurse,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reason::OversizedLeaf { .. } => "oversized leaf",
            Reason::OversizedContainer { .. } => "oversized container",
            Reason::TooShort { .. } => "too short",
            Reason::Unit { .. } => "unit",
            Reason::Homogeneous { .. } => "homogeneous children",
            Reason::Heterogeneous { .. } => "heterogeneous children",
            Reason::Childless { .. } => "large childless",
        }
    }
}

/// Population variance; `None` for an empty input.
pub fn population_variance<I>(lengths: I) -> Option<f64>
where
    I: IntoIterator<Item = usize>,
{
    let values: Vec<f64> = lengths.into_iter().map(|len| len as f64).collect();
    if values.is_empty() {
        return None;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count)
}

/// Evaluate the rules for a single node, in priority order.
pub fn decide(node: &ContentNode, thresholds: &DecisionThresholds) -> Reason {
    let len = node.content_len();

    if len > thresholds.leaf_max_len {
        return if node.is_leaf() {
            Reason::OversizedLeaf { len }
        } else {
            Reason::OversizedContainer { len }
        };
    }
    if len < thresholds.min_len {
        return Reason::TooShort { len };
    }
    if len < thresholds.unit_max_len {
        return Reason::Unit { len };
    }

    match population_variance(node.children.iter().map(ContentNode::content_len)) {
        None => Reason::Childless { len },
        Some(variance) if variance < thresholds.variance_max => {
            Reason::Homogeneous { len, variance }
        }
        Some(variance) => Reason::Heterogeneous { len, variance },
    }
}

/// A visited node and the rule applied to it
#[derive(Debug, Clone, Copy)]
pub struct Decision<'a> {
    pub node: &'a ContentNode,
    pub reason: Reason,
    /// Distance from the walk root
    pub depth: usize,
}

impl<'a> Decision<'a> {
    pub fn action(&self) -> Action {
        self.reason.action()
    }
}

/// Lazy depth-first, pre-order decision iterator.
///
/// Each node is visited at most once; children are only reached through a
/// `Recurse` decision on their parent.
pub struct DecisionWalk<'a> {
    stack: Vec<(&'a ContentNode, usize)>,
    thresholds: &'a DecisionThresholds,
}

impl<'a> DecisionWalk<'a> {
    pub fn new(root: &'a ContentNode, thresholds: &'a DecisionThresholds) -> Self {
        Self {
            stack: vec![(root, 0)],
            thresholds,
        }
    }
}

impl<'a> Iterator for DecisionWalk<'a> {
    type Item = Decision<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        let reason = decide(node, self.thresholds);
        if reason.action() == Action::Recurse {
            // Reverse so the first child is popped first.
            self.stack
                .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        Some(Decision {
            node,
            reason,
            depth,
        })
    }
}

pub fn walk<'a>(root: &'a ContentNode, thresholds: &'a DecisionThresholds) -> DecisionWalk<'a> {
    DecisionWalk::new(root, thresholds)
}
