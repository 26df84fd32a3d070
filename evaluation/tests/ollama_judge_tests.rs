#![cfg(feature = "ollama")]

use evaluation::prelude::*;
use mockito::Matcher;
use model::{OllamaConfig, OllamaProvider};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

const YES_BODY: &str =
    r#"{"message":{"role":"assistant","content":"YES"},"done":true,"prompt_eval_count":12,"eval_count":1}"#;

fn judge_for(server: &mockito::Server) -> RelevancyJudge {
    let config = OllamaConfig::vision_default().with_base_url(server.url());
    RelevancyJudge::new(Arc::new(OllamaProvider::new(config).unwrap()))
}

// Plain #[test]: the blocking client must run outside any tokio runtime.
#[test]
fn test_blocking_evaluate_against_ollama() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("cat.png");
    fs::write(&image, b"image").unwrap();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "llava",
            "stream": false,
            "messages": [{"role": "user", "images": ["aW1hZ2U="]}],
        })))
        .with_status(200)
        .with_body(YES_BODY)
        .create();

    let request = EvaluationRequest::new("Is this a cat?", "Yes, it is a cat.", ["A cat."])
        .with_image_paths([image.clone()]);
    let result = judge_for(&server).evaluate(&request).unwrap();

    mock.assert();
    assert!(result.passing());
    assert_eq!(result.feedback(), "YES");
}

#[tokio::test]
async fn test_async_evaluate_against_ollama() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(YES_BODY)
        .create_async()
        .await;

    let request = EvaluationRequest::new("Is this a cat?", "Yes, it is a cat.", ["A cat."]);
    let result = judge_for(&server).aevaluate(&request).await.unwrap();

    mock.assert_async().await;
    assert!(result.passing());
    assert_eq!(result.score(), 1.0);
}
