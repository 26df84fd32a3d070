use model::{
    ChatMessage, ChatRequest, FinishReason, ImageNode, ModelProvider, MultiModalLlm, OllamaConfig,
    OllamaProvider,
};
use std::time::Duration;

const MODEL: &str = "llava";
const TIMEOUT: Duration = Duration::from_secs(120);

// 1x1 red PNG.
const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

fn make_provider() -> OllamaProvider {
    OllamaProvider::new(OllamaConfig::vision_default().with_timeout(TIMEOUT))
        .expect("provider creation")
}

fn red_pixel() -> ImageNode {
    ImageNode::new("red.png#0", RED_PIXEL_PNG).with_mime_type("image/png")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let provider = make_provider();

    let result = tokio::time::timeout(TIMEOUT, provider.health_check()).await;
    let health = result.expect("health_check timed out");
    health.expect("health_check failed");

    let models = tokio::time::timeout(TIMEOUT, provider.list_models())
        .await
        .expect("list_models timed out")
        .expect("list_models failed");

    assert!(
        models.iter().any(|m| m.name.starts_with(MODEL)),
        "{} model must be present, found: {:?}",
        MODEL,
        models.iter().map(|m| &m.name).collect::<Vec<_>>()
    );
}

#[tokio::test]
#[ignore]
async fn test_chat_with_image() {
    let provider = make_provider();
    let request = ChatRequest::new(
        MODEL,
        vec![ChatMessage::user_with_images(
            "What color is this image? Answer with one word.",
            vec![red_pixel()],
        )],
    );

    let response = tokio::time::timeout(TIMEOUT, provider.chat(request))
        .await
        .expect("chat timed out")
        .expect("chat failed");

    let choice = &response.choices[0];
    assert!(
        matches!(
            choice.finish_reason,
            Some(FinishReason::Stop) | Some(FinishReason::Length)
        ),
        "unexpected finish reason {:?}",
        choice.finish_reason
    );
    assert!(!response.text().is_empty(), "content must not be empty");
}

#[tokio::test]
#[ignore]
async fn test_acomplete_yes_no() {
    let provider = make_provider();
    let prompt = "Answer with YES or NO only. Is the sky usually blue on a clear day?";

    let response = tokio::time::timeout(TIMEOUT, provider.acomplete(prompt, &[red_pixel()]))
        .await
        .expect("acomplete timed out")
        .expect("acomplete failed");

    assert!(!response.text.is_empty());
}

#[test]
#[ignore]
fn test_complete_blocking_without_images() {
    let provider = make_provider();
    let response = provider
        .complete("Answer with YES or NO only. Is 2+2 equal to 4?", &[])
        .expect("complete failed");

    assert!(!response.text.is_empty());
}
