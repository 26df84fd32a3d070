use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used by the default vision backend.
pub const DEFAULT_VISION_MODEL: &str = "llava";

/// Generation cap used by the default vision backend.
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_model: String,
    pub default_context_length: u32,
    pub default_temperature: f32,
    pub default_max_tokens: Option<u32>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(30),
            default_model: DEFAULT_VISION_MODEL.to_string(),
            default_context_length: 110_000,
            default_temperature: 0.7,
            default_max_tokens: None,
        }
    }
}

impl OllamaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings of the preconfigured judge backend: `llava` capped at 1000 tokens.
    pub fn vision_default() -> Self {
        Self::default()
            .with_model(DEFAULT_VISION_MODEL)
            .with_max_tokens(DEFAULT_VISION_MAX_TOKENS)
            .with_timeout(Duration::from_secs(120))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_context_length(mut self, context_length: u32) -> Self {
        self.default_context_length = context_length;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = Some(max_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("Base URL {} is not a valid URL: {}", self.base_url, e))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err("Base URL must include a host".to_string());
        }

        if self.default_model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if self.default_context_length == 0 {
            return Err("Context length must be greater than 0".to_string());
        }

        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err("Temperature must be between 0.0 and 2.0".to_string());
        }

        if let Some(max_tokens) = self.default_max_tokens {
            if max_tokens == 0 {
                return Err("Max tokens must be greater than 0".to_string());
            }
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
