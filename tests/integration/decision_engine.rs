//! End-to-end decision walk through the executor with a scripted model.

use crate::integration::test_utils::{filler, leaf, parent, ScriptedClient};
use std::sync::Arc;
use veil::engine::{Classifier, DecisionThresholds, RedactionExecutor, ScanGeneration};
use veil::policy::PolicyStore;
use veil::predicate::RedactionPredicate;
use veil::sink::RecordingSink;
use veil::types::{ContentNode, NodeHandle};

fn executor(client: Arc<ScriptedClient>) -> RedactionExecutor {
    let store = Arc::new(PolicyStore::temporary().unwrap());
    let predicate: Arc<dyn Classifier> =
        Arc::new(RedactionPredicate::new(client, store, "classify-model"));
    RedactionExecutor::new(predicate, DecisionThresholds::default(), 4)
}

async fn scan(client: &Arc<ScriptedClient>, tree: &ContentNode) -> (Vec<String>, RecordingSink) {
    let sink = RecordingSink::new();
    executor(Arc::clone(client))
        .execute(tree, &sink, &ScanGeneration::detached())
        .await;
    let mut turns = client.user_turns();
    turns.sort();
    (turns, sink)
}

#[tokio::test]
async fn test_homogeneous_children_are_classified_instead_of_root() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    let tree = parent("root", 600, vec![leaf("left", 590), leaf("right", 610)]);

    let (turns, _) = scan(&client, &tree).await;

    assert_eq!(turns, vec![filler("left", 590), filler("right", 610)]);
}

#[tokio::test]
async fn test_heterogeneous_children_classify_root_once() {
    let client = Arc::new(ScriptedClient::replying(&["DROP"]));
    let tree = parent("root", 600, vec![leaf("small", 50), leaf("large", 1000)]);

    let (turns, sink) = scan(&client, &tree).await;

    assert_eq!(turns, vec![filler("root", 600)]);
    assert_eq!(turns[0].chars().count(), 600);
    assert_eq!(sink.active(), vec![NodeHandle::new("root")]);
}

#[tokio::test]
async fn test_short_node_hides_its_subtree() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    let tree = parent("tiny", 4, vec![leaf("child", 100), leaf("other", 200)]);

    let (turns, sink) = scan(&client, &tree).await;

    assert!(turns.is_empty());
    assert!(sink.applied().is_empty());
}

#[tokio::test]
async fn test_oversized_leaf_is_never_classified() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    let tree = leaf("huge", 3501);

    let sink = RecordingSink::new();
    let report = executor(Arc::clone(&client))
        .execute(&tree, &sink, &ScanGeneration::detached())
        .await;

    assert!(client.calls().is_empty());
    assert_eq!(report.oversized, vec![NodeHandle::new("huge")]);
}

#[tokio::test]
async fn test_unit_nodes_use_own_content_as_user_turn() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    let tree = leaf("unit", 5);

    let (turns, _) = scan(&client, &tree).await;

    assert_eq!(turns, vec![filler("unit", 5)]);
    let calls = client.calls();
    assert_eq!(calls[0].1, "classify-model");
    assert_eq!(calls[0].0.len(), 2);
}

#[tokio::test]
async fn test_large_childless_node_is_classified_whole() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    let tree = leaf("essay", 1200);

    let (turns, _) = scan(&client, &tree).await;

    assert_eq!(turns, vec![filler("essay", 1200)]);
}

#[tokio::test]
async fn test_recursion_applies_rules_at_every_level() {
    let client = Arc::new(ScriptedClient::replying(&[]));
    // Oversized container: children are visited regardless of variance.
    let tree = parent(
        "page",
        4000,
        vec![
            parent("article", 700, vec![leaf("p1", 700), leaf("p2", 710)]),
            leaf("caption", 40),
            leaf("dot", 2),
        ],
    );

    let (turns, _) = scan(&client, &tree).await;

    assert_eq!(
        turns,
        vec![filler("caption", 40), filler("p1", 700), filler("p2", 710)]
    );
}

#[tokio::test]
async fn test_failed_classification_leaves_siblings_alone() {
    let client = Arc::new(ScriptedClient::new(vec![
        Err(veil::error::ApiError::ProviderRateLimit("slow down".to_string())),
        Ok("DROP".to_string()),
    ]));
    let tree = parent("list", 600, vec![leaf("a", 600), leaf("b", 600)]);

    let sink = RecordingSink::new();
    let report = executor(Arc::clone(&client))
        .execute(&tree, &sink, &ScanGeneration::detached())
        .await;

    assert_eq!(report.classified, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.redacted.len(), 1);
    assert_eq!(sink.active().len(), 1);
}
