//! HTTP completion client against a one-shot local stub server.

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use veil::provider::{AuthScheme, ChatMessage, CompletionClient, HttpCompletionClient, ProviderConfig};

/// Captured request: lowercased header block and body
struct Captured {
    head: String,
    body: String,
}

/// Serve exactly one request with `status` and `body`; the request is sent back
/// through the returned channel.
async fn stub_server(status: u16, body: &'static str) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let (head, body_start, content_length) = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..pos]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|value| value.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                break (head, pos + 4, content_length);
            }
        };
        while raw.len() < body_start + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before body");
            raw.extend_from_slice(&buf[..n]);
        }
        let request_body =
            String::from_utf8_lossy(&raw[body_start..body_start + content_length]).to_string();

        let response = format!(
            "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(Captured {
            head,
            body: request_body,
        });
    });

    (format!("http://{}/v1", addr), rx)
}

fn client(api_url: String, auth: AuthScheme) -> HttpCompletionClient {
    HttpCompletionClient::new(&ProviderConfig {
        api_url,
        api_key: Some("test-key".to_string()),
        auth,
        ..ProviderConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_posts_messages_in_order_with_bearer_key() {
    let (url, captured) = stub_server(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"DROP"}}]}"#,
    )
    .await;

    let text = client(url, AuthScheme::Bearer)
        .complete(
            vec![
                ChatMessage::system("guidelines"),
                ChatMessage::user("some content"),
            ],
            "small-model",
        )
        .await
        .unwrap();
    assert_eq!(text, "DROP");

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("post /v1/chat/completions "));
    assert!(request.head.contains("authorization: bearer test-key"));

    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["model"], "small-model");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "guidelines");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "some content");
}

#[tokio::test]
async fn test_api_key_header_scheme() {
    let (url, captured) = stub_server(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"FORWARD"}}]}"#,
    )
    .await;

    let text = client(url, AuthScheme::ApiKeyHeader)
        .complete(vec![ChatMessage::user("hello")], "m")
        .await
        .unwrap();
    assert_eq!(text, "FORWARD");

    let request = captured.await.unwrap();
    assert!(request.head.contains("x-api-key: test-key"));
    assert!(!request.head.contains("authorization:"));
}

#[tokio::test]
async fn test_non_success_status_is_a_transport_error() {
    let (url, _captured) = stub_server(503, r#"{"error":"overloaded"}"#).await;

    let err = client(url, AuthScheme::Bearer)
        .complete(vec![ChatMessage::user("hello")], "m")
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_missing_key_fails_before_any_request() {
    let client = HttpCompletionClient::new(&ProviderConfig {
        api_url: "http://127.0.0.1:9/v1".to_string(),
        ..ProviderConfig::default()
    })
    .unwrap();

    let err = client
        .complete(vec![ChatMessage::user("hello")], "m")
        .await
        .unwrap_err();
    assert!(err.is_config());
}
