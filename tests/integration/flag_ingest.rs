//! Flag ingestion into durable history and the fold queue.

use crate::integration::test_utils::ScriptedClient;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use veil::ingest::FlagIngestor;
use veil::policy::{open_state, FoldConfig, FoldQueue, PolicyConfig};

#[tokio::test]
async fn test_flags_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state");
    let long_sample = "Squids live in the deep ocean and squirt ink when they are threatened.";

    {
        let (policy, history) = open_state(&path, &PolicyConfig::default()).unwrap();
        let policy = Arc::new(policy);
        let history = Arc::new(history);
        let client = Arc::new(ScriptedClient::replying(&[
            "```Flag squids and anything about ink.```",
            "```Flag squids, ink and holes.```",
        ]));
        let queue = FoldQueue::new(
            client.clone(),
            Arc::clone(&policy),
            "big",
            FoldConfig {
                max_attempts: 3,
                retry_delay_ms: 0,
            },
        );
        let ingestor = FlagIngestor::new(Arc::clone(&history), Arc::clone(&queue));

        assert!(ingestor.flag(long_sample).unwrap().recorded);
        assert!(!ingestor.flag("holes").unwrap().recorded);
        queue
            .wait_for_idle(Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(client.calls().len(), 2);

        // The worker task holds the last other reference until it returns.
        drop(ingestor);
        while Arc::strong_count(&queue) > 1 {
            tokio::task::yield_now().await;
        }
    }

    let (policy, history) = open_state(&path, &PolicyConfig::default()).unwrap();
    assert_eq!(policy.read(), "Flag squids, ink and holes.");
    assert!(!policy.is_default());

    let samples = history.list().unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].content, long_sample);
}
