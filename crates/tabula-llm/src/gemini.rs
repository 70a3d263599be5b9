//! HTTP-backed [`LanguageModel`] for the Gemini generateContent API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use tabula_core::config::LlmConfig;

use crate::{LanguageModel, LlmError};

pub struct GeminiModel {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(api_base: String, model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_base,
            model,
            api_key,
        }
    }

    /// Build from config, resolving the API key from the configured
    /// environment variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(
            config.api_base.clone(),
            config.model.clone(),
            api_key,
        ))
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("gemini error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(LlmError::InvalidResponse)?
            .trim()
            .to_string();

        Ok(content)
    }
}
