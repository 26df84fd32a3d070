pub mod config;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod provider;
pub mod types;

pub use config::{OllamaConfig, DEFAULT_VISION_MAX_TOKENS, DEFAULT_VISION_MODEL};
pub use provider::{ModelError, ModelProvider, ModelResult, MultiModalLlm};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, Choice, CompletionResponse, FinishReason, ImageNode,
    MessageRole, ModelInfo, Usage,
};

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::provider::*;
    pub use crate::types::*;

    #[cfg(feature = "ollama")]
    pub use crate::ollama::*;
}
