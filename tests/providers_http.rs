//! Contract tests for the HTTP collaborators against a local mock server.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use manualsmith::chat::{ChatProvider, OpenAiChat};
use manualsmith::embeddings::{EmbeddingProvider, OpenAiEmbeddings};
use manualsmith::extraction::{DocumentAnalyzer, LayoutClient};
use manualsmith::message::Message;
use manualsmith::types::AssistantError;

const TIMEOUT: Duration = Duration::from_secs(5);

fn base_url(server: &MockServer) -> Url {
    Url::parse(&server.base_url()).unwrap()
}

#[tokio::test]
async fn embeddings_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/test-embed/embeddings")
                .query_param("api-version", "2024-12-01-preview")
                .header("api-key", "secret")
                .json_body_partial(r#"{"input": "brake fluid"}"#);
            then.status(200)
                .json_body(json!({"data": [{"embedding": [0.25, -0.5, 1.0]}]}));
        })
        .await;

    let provider = OpenAiEmbeddings::new(
        base_url(&server),
        "secret".into(),
        "2024-12-01-preview".into(),
        "test-embed".into(),
        TIMEOUT,
    )
    .unwrap();

    let vector = provider.embed("brake fluid").await.unwrap();
    assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedding_http_failure_is_typed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/test-embed/embeddings");
            then.status(429).body("rate limited");
        })
        .await;

    let provider = OpenAiEmbeddings::new(
        base_url(&server),
        "secret".into(),
        "2024-12-01-preview".into(),
        "test-embed".into(),
        TIMEOUT,
    )
    .unwrap();

    let err = provider.embed("anything").await.unwrap_err();
    assert!(matches!(err, AssistantError::Embedding(_)));
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn chat_round_trip_with_temperature() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/test-chat/chat/completions")
                .json_body_partial(r#"{"temperature": 0.2}"#);
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "Check page 412."}}]
            }));
        })
        .await;

    let provider = OpenAiChat::new(
        base_url(&server),
        "secret".into(),
        "2024-12-01-preview".into(),
        "test-chat".into(),
        TIMEOUT,
    )
    .unwrap();

    let reply = provider
        .complete(&[Message::user("where are the fuses?")], Some(0.2))
        .await
        .unwrap();
    assert_eq!(reply, "Check page 412.");
    mock.assert_async().await;
}

#[tokio::test]
async fn chat_empty_choices_is_a_chat_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/test-chat/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let provider = OpenAiChat::new(
        base_url(&server),
        "secret".into(),
        "2024-12-01-preview".into(),
        "test-chat".into(),
        TIMEOUT,
    )
    .unwrap();

    let err = provider
        .complete(&[Message::user("hello")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::Chat(_)));
}

#[tokio::test]
async fn layout_analysis_submits_then_polls() {
    let server = MockServer::start_async().await;
    let operation_url = format!("{}/operations/123", server.base_url());

    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/documentintelligence/documentModels/prebuilt-read:analyze");
            then.status(202)
                .header("operation-location", operation_url.clone());
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/123");
            then.status(200).json_body(json!({
                "status": "succeeded",
                "analyzeResult": {
                    "pages": [
                        {"lines": [{"content": "Warning Lights"}, {"content": "See page 89."}]}
                    ]
                }
            }));
        })
        .await;

    let client = LayoutClient::new(base_url(&server), "secret".into(), TIMEOUT)
        .unwrap()
        .with_polling(Duration::from_millis(10), 5);

    let pages = client.analyze(b"%PDF-fake").await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].lines, vec!["Warning Lights", "See page 89."]);
    submit.assert_async().await;
    poll.assert_async().await;
}

#[tokio::test]
async fn layout_analysis_failure_status_is_an_extraction_error() {
    let server = MockServer::start_async().await;
    let operation_url = format!("{}/operations/err", server.base_url());

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/documentintelligence/documentModels/prebuilt-read:analyze");
            then.status(202)
                .header("operation-location", operation_url.clone());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/err");
            then.status(200)
                .json_body(json!({"status": "failed", "error": {"code": "InvalidContent"}}));
        })
        .await;

    let client = LayoutClient::new(base_url(&server), "secret".into(), TIMEOUT)
        .unwrap()
        .with_polling(Duration::from_millis(10), 5);

    let err = client.analyze(b"%PDF-fake").await.unwrap_err();
    assert!(matches!(err, AssistantError::Extraction(_)));
}
