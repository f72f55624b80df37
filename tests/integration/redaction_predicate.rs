//! Redaction predicate against a scripted model.

use crate::integration::test_utils::ScriptedClient;
use std::sync::Arc;
use veil::error::ApiError;
use veil::policy::{PolicyStore, DEFAULT_POLICY};
use veil::predicate::{moderation_prompt, RedactionPredicate};
use veil::provider::MessageRole;

fn predicate(client: &Arc<ScriptedClient>, store: Arc<PolicyStore>) -> RedactionPredicate {
    RedactionPredicate::new(client.clone(), store, "small")
}

#[tokio::test]
async fn test_verdict_markers() {
    let client = Arc::new(ScriptedClient::replying(&[
        "DROP, confirmed",
        "I will FORWARD this",
        "ok",
    ]));
    let predicate = predicate(&client, Arc::new(PolicyStore::temporary().unwrap()));

    assert!(predicate.should_redact("squid facts").await.unwrap());
    assert!(!predicate.should_redact("weather").await.unwrap());
    // Unparseable answers fail open.
    assert!(!predicate.should_redact("anything").await.unwrap());
}

#[tokio::test]
async fn test_request_carries_policy_and_content() {
    let client = Arc::new(ScriptedClient::replying(&["FORWARD"]));
    let store = Arc::new(PolicyStore::temporary().unwrap());
    let predicate = predicate(&client, Arc::clone(&store));

    predicate.should_redact("first").await.unwrap();
    store
        .write("Please flag content that refers to octopuses.")
        .unwrap();
    predicate.should_redact("second").await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);

    let (messages, model) = &calls[0];
    assert_eq!(model, "small");
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[0].content, moderation_prompt(DEFAULT_POLICY));
    assert_eq!(messages[1].role, MessageRole::User);
    assert_eq!(messages[1].content, "first");

    // Each call reads the policy in force at that moment.
    assert!(calls[1].0[0].content.contains("octopuses"));
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let client = Arc::new(ScriptedClient::new(vec![
        Err(ApiError::ProviderRequestFailed {
            status: 500,
            message: "boom".to_string(),
        }),
        Err(ApiError::ProviderNotConfigured("no key".to_string())),
    ]));
    let predicate = predicate(&client, Arc::new(PolicyStore::temporary().unwrap()));

    let err = predicate.should_redact("x").await.unwrap_err();
    assert!(err.is_transport());
    let err = predicate.should_redact("x").await.unwrap_err();
    assert!(err.is_config());
    // No retries at this layer.
    assert_eq!(client.calls().len(), 2);
}
