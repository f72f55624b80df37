//! Property-based tests for decision walk invariants

use proptest::prelude::*;
use std::collections::HashSet;
use veil::engine::{decide, walk, Action, DecisionThresholds};
use veil::types::{ContentNode, NodeHandle};

/// Random tree shapes; handles are assigned afterwards by [`number`].
fn tree_strategy() -> impl Strategy<Value = ContentNode> {
    let lengths = prop_oneof![0usize..10, 0usize..600, 400usize..4000];
    let leaf = lengths
        .clone()
        .prop_map(|len| ContentNode::new("p", "x".repeat(len), NodeHandle::new("")));
    leaf.prop_recursive(4, 64, 6, move |inner| {
        (lengths.clone(), prop::collection::vec(inner, 0..6)).prop_map(|(len, children)| {
            ContentNode::new("div", "y".repeat(len), NodeHandle::new("")).with_children(children)
        })
    })
}

fn number(node: &mut ContentNode, next: &mut usize) {
    node.handle = NodeHandle::new(format!("n{}", next));
    *next += 1;
    for child in &mut node.children {
        number(child, next);
    }
}

fn numbered_tree() -> impl Strategy<Value = ContentNode> {
    tree_strategy().prop_map(|mut tree| {
        number(&mut tree, &mut 0);
        tree
    })
}

fn collect_handles(node: &ContentNode, out: &mut Vec<NodeHandle>) {
    out.push(node.handle.clone());
    for child in &node.children {
        collect_handles(child, out);
    }
}

/// Every node is visited at most once and the root always is.
#[test]
fn test_walk_visits_each_node_at_most_once() {
    let thresholds = DecisionThresholds::default();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&numbered_tree(), |tree| {
            let visited: Vec<&NodeHandle> =
                walk(&tree, &thresholds).map(|d| &d.node.handle).collect();
            let unique: HashSet<&NodeHandle> = visited.iter().copied().collect();
            prop_assert_eq!(unique.len(), visited.len());
            prop_assert!(visited.len() <= tree.node_count());
            prop_assert_eq!(visited.first().copied(), Some(&tree.handle));
            Ok(())
        })
        .unwrap();
}

/// Classified nodes are never shorter than `min_len` or longer than `leaf_max_len`.
#[test]
fn test_classified_nodes_are_within_bounds() {
    let thresholds = DecisionThresholds::default();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&numbered_tree(), |tree| {
            for decision in walk(&tree, &thresholds) {
                if decision.action() == Action::Classify {
                    let len = decision.node.content_len();
                    prop_assert!(len >= thresholds.min_len);
                    prop_assert!(len <= thresholds.leaf_max_len);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Nothing below a classified or ignored node is visited; everything below a
/// recursed node is.
#[test]
fn test_descent_follows_the_decision() {
    let thresholds = DecisionThresholds::default();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&numbered_tree(), |tree| {
            let decisions: Vec<_> = walk(&tree, &thresholds).collect();
            let visited: HashSet<&NodeHandle> =
                decisions.iter().map(|d| &d.node.handle).collect();

            for decision in &decisions {
                let mut below = Vec::new();
                for child in &decision.node.children {
                    collect_handles(child, &mut below);
                }
                match decision.action() {
                    Action::Recurse => {
                        for child in &decision.node.children {
                            prop_assert!(visited.contains(&child.handle));
                        }
                    }
                    Action::Classify | Action::Ignore => {
                        for handle in &below {
                            prop_assert!(!visited.contains(handle));
                        }
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}

/// The decision for a node depends only on the node and the thresholds.
#[test]
fn test_decide_is_deterministic() {
    let thresholds = DecisionThresholds::default();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&numbered_tree(), |tree| {
            let first: Vec<_> = walk(&tree, &thresholds)
                .map(|d| (d.node.handle.clone(), d.reason, d.depth))
                .collect();
            let second: Vec<_> = walk(&tree, &thresholds)
                .map(|d| (d.node.handle.clone(), d.reason, d.depth))
                .collect();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first[0].1, decide(&tree, &thresholds));
            Ok(())
        })
        .unwrap();
}
