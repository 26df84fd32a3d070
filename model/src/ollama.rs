use crate::config::OllamaConfig;
use crate::provider::{ModelError, ModelProvider, ModelResult, MultiModalLlm};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, Choice, CompletionResponse, FinishReason, ImageNode,
    MessageRole, ModelInfo, Usage,
};
use async_trait::async_trait;
use ollama_rs::Ollama;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, error, info};

#[derive(Serialize)]
struct OllamaApiRequest {
    model: String,
    messages: Vec<OllamaApiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaApiOptions>,
}

#[derive(Serialize)]
struct OllamaApiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Serialize)]
struct OllamaApiOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaApiResponse {
    message: OllamaApiResponseMessage,
    #[allow(dead_code)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaApiResponseMessage {
    #[allow(dead_code)]
    role: String,
    content: String,
}

/// Ollama backend. Vision models such as `llava` receive images as base64 strings.
pub struct OllamaProvider {
    client: Ollama,
    http_client: reqwest::Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
    base_url: String,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> ModelResult<Self> {
        config
            .validate()
            .map_err(|msg| ModelError::InvalidConfig { message: msg })?;

        let host = if config.base_url.ends_with("/v1") {
            config.base_url[..config.base_url.len() - 3].to_string()
        } else {
            config.base_url.clone()
        };

        let base_url = if host.ends_with('/') {
            host.clone()
        } else {
            format!("{}/", host)
        };

        let client = Self::ollama_client(&host)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Unknown {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            http_client,
            blocking_client: OnceLock::new(),
            base_url,
            config,
        })
    }

    // ollama-rs takes the port separately and overrides whatever the URL carries.
    fn ollama_client(host: &str) -> ModelResult<Ollama> {
        let url = reqwest::Url::parse(host).map_err(|e| ModelError::InvalidConfig {
            message: format!("Base URL {} is not a valid URL: {}", host, e),
        })?;
        let host_name = url.host_str().ok_or_else(|| ModelError::InvalidConfig {
            message: format!("Base URL {} has no host", host),
        })?;
        let port = url.port_or_known_default().unwrap_or(11434);

        Ok(Ollama::new(format!("{}://{}", url.scheme(), host_name), port))
    }

    pub fn with_default_config() -> ModelResult<Self> {
        Self::new(OllamaConfig::default())
    }

    /// The preconfigured vision judge backend.
    pub fn vision_default() -> ModelResult<Self> {
        Self::new(OllamaConfig::vision_default())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}api/chat", self.base_url)
    }

    // Built on first blocking call so async-only users never spawn its runtime thread.
    fn blocking_client(&self) -> ModelResult<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking_client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| ModelError::Unknown {
                message: format!("Failed to build blocking HTTP client: {}", e),
            })?;
        Ok(self.blocking_client.get_or_init(|| client))
    }

    fn completion_request(&self, prompt: &str, images: &[ImageNode]) -> ChatRequest {
        let request = ChatRequest::new(
            self.config.default_model.clone(),
            vec![ChatMessage::user_with_images(prompt, images.to_vec())],
        )
        .with_temperature(self.config.default_temperature)
        .with_context_length(self.config.default_context_length);

        match self.config.default_max_tokens {
            Some(max_tokens) => request.with_max_tokens(max_tokens),
            None => request,
        }
    }

    fn convert_message_to_api(msg: &ChatMessage) -> OllamaApiMessage {
        let role = match &msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        let images = msg.images.as_ref().map_or_else(Vec::new, |images| {
            images.iter().map(|image| image.data.clone()).collect()
        });

        OllamaApiMessage {
            role: role.to_string(),
            content: msg.content.clone().unwrap_or_default(),
            images,
        }
    }

    fn build_request_body(request: &ChatRequest) -> OllamaApiRequest {
        let messages = request
            .messages
            .iter()
            .map(Self::convert_message_to_api)
            .collect();

        let options = if request.temperature.is_some()
            || request.max_tokens.is_some()
            || request.context_length.is_some()
        {
            Some(OllamaApiOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                num_ctx: request.context_length,
            })
        } else {
            None
        };

        OllamaApiRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            options,
        }
    }

    fn parse_response(response: OllamaApiResponse) -> ChatResponse {
        let content = if response.message.content.is_empty() {
            None
        } else {
            Some(response.message.content)
        };

        let finish_reason = match response.done_reason.as_deref() {
            Some("length") => Some(FinishReason::Length),
            _ => Some(FinishReason::Stop),
        };

        let message = ChatMessage {
            role: MessageRole::Assistant,
            content,
            images: None,
        };

        let choice = Choice {
            message,
            finish_reason,
        };

        let usage = Some(Usage {
            prompt_tokens: response.prompt_eval_count.unwrap_or(0) as u32,
            completion_tokens: response.eval_count.unwrap_or(0) as u32,
            total_tokens: (response.prompt_eval_count.unwrap_or(0)
                + response.eval_count.unwrap_or(0)) as u32,
        });

        ChatResponse {
            choices: vec![choice],
            usage,
        }
    }

    fn map_send_error(e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::ServiceUnavailable {
                message: "Request timeout".to_string(),
            }
        } else if e.is_connect() {
            ModelError::ServiceUnavailable {
                message: "Cannot connect to Ollama service".to_string(),
            }
        } else {
            ModelError::Network(e)
        }
    }

    fn status_error(status: reqwest::StatusCode, model: &str, error_text: String) -> ModelError {
        if status == reqwest::StatusCode::NOT_FOUND {
            ModelError::ModelNotFound {
                model: model.to_string(),
            }
        } else {
            ModelError::Unknown {
                message: format!("Ollama API returned {}: {}", status, error_text),
            }
        }
    }

    fn handle_ollama_error(err: ollama_rs::error::OllamaError) -> ModelError {
        match err {
            ollama_rs::error::OllamaError::ReqwestError(e) => {
                if e.is_timeout() {
                    ModelError::ServiceUnavailable {
                        message: "Request timeout".to_string(),
                    }
                } else if e.is_connect() {
                    ModelError::ServiceUnavailable {
                        message: "Cannot connect to Ollama service".to_string(),
                    }
                } else {
                    ModelError::Unknown {
                        message: format!("Network error: {}", e),
                    }
                }
            }
            ollama_rs::error::OllamaError::JsonError(e) => ModelError::Serialization(e),
            _ => ModelError::Unknown {
                message: format!("Ollama error: {}", err),
            },
        }
    }

    fn chat_blocking(&self, request: ChatRequest) -> ModelResult<ChatResponse> {
        debug!("Starting blocking chat request with model: {}", request.model);

        let body = Self::build_request_body(&request);
        let http_response = self
            .blocking_client()?
            .post(self.chat_url())
            .json(&body)
            .send()
            .map_err(Self::map_send_error)?;

        let status = http_response.status();
        if !status.is_success() {
            let error_text = http_response.text().unwrap_or_default();
            return Err(Self::status_error(status, &request.model, error_text));
        }

        let api_response: OllamaApiResponse = http_response.json().map_err(ModelError::Network)?;

        info!("Blocking chat request completed successfully");
        Ok(Self::parse_response(api_response))
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn chat(&self, request: ChatRequest) -> ModelResult<ChatResponse> {
        debug!("Starting chat request with model: {}", request.model);

        let body = Self::build_request_body(&request);

        let http_response = self
            .http_client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = http_response.status();
        if !status.is_success() {
            let error_text = http_response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &request.model, error_text));
        }

        let api_response: OllamaApiResponse =
            http_response.json().await.map_err(ModelError::Network)?;

        let chat_response = Self::parse_response(api_response);

        info!("Chat request completed successfully");

        Ok(chat_response)
    }

    async fn list_models(&self) -> ModelResult<Vec<ModelInfo>> {
        debug!("Listing available models");

        let models = self
            .client
            .list_local_models()
            .await
            .map_err(Self::handle_ollama_error)?;

        let model_infos: Vec<ModelInfo> = models
            .into_iter()
            .map(|model| ModelInfo {
                name: model.name,
                size: Some(model.size),
                digest: None,
                modified_at: Some(model.modified_at),
            })
            .collect();

        info!("Retrieved {} models", model_infos.len());
        Ok(model_infos)
    }

    async fn health_check(&self) -> ModelResult<()> {
        debug!("Performing health check");

        match self.list_models().await {
            Ok(_) => {
                info!("Health check passed");
                Ok(())
            }
            Err(e) => {
                error!("Health check failed: {}", e);
                Err(e)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[async_trait]
impl MultiModalLlm for OllamaProvider {
    fn complete(&self, prompt: &str, images: &[ImageNode]) -> ModelResult<CompletionResponse> {
        let request = self.completion_request(prompt, images);
        Ok(self.chat_blocking(request)?.into())
    }

    async fn acomplete(
        &self,
        prompt: &str,
        images: &[ImageNode],
    ) -> ModelResult<CompletionResponse> {
        let request = self.completion_request(prompt, images);
        Ok(self.chat(request).await?.into())
    }

    fn model_name(&self) -> &str {
        &self.config.default_model
    }
}
