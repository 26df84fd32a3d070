use crate::types::{ChatRequest, ChatResponse, CompletionResponse, ImageNode, ModelInfo};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> ModelResult<ChatResponse>;

    async fn list_models(&self) -> ModelResult<Vec<ModelInfo>>;

    async fn health_check(&self) -> ModelResult<()>;

    fn provider_name(&self) -> &'static str;
}

/// A vision-capable model that completes a single prompt against a set of images.
///
/// The output is untyped text. Callers decide how to interpret it.
#[async_trait]
pub trait MultiModalLlm: Send + Sync {
    /// Blocking completion. Must not be called from inside an async runtime.
    fn complete(&self, prompt: &str, images: &[ImageNode]) -> ModelResult<CompletionResponse>;

    async fn acomplete(&self, prompt: &str, images: &[ImageNode])
        -> ModelResult<CompletionResponse>;

    fn model_name(&self) -> &str;
}
