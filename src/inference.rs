//! Inference backends.
//!
//! Implements [`InferenceClient`] for an OpenAI-compatible chat completions
//! endpoint (Groq by default) plus a disabled backend that always fails.
//! With the disabled backend intent classification fails, so every query
//! ends in the error handler; commands that only touch the store still work.
//!
//! # Supported Providers
//!
//! | Config Value | Client |
//! |-------------|--------|
//! | `"disabled"` | [`DisabledInference`] |
//! | `"openai-compatible"` | [`OpenAiCompatibleClient`] |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use hiring_orchestrator_core::inference::InferenceClient;

use crate::config::InferenceConfig;

// ============ Disabled Backend ============

/// A backend that fails every call.
///
/// Used when `inference.provider = "disabled"`. Every query is classified
/// as ERROR and answered by the error handler.
pub struct DisabledInference;

#[async_trait]
impl InferenceClient for DisabledInference {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Inference provider is disabled")
    }
}

// ============ OpenAI-compatible Backend ============

/// Chat completions client for any OpenAI-compatible API.
///
/// Sends a single user message to `POST {base_url}/chat/completions` and
/// returns `choices[0].message.content`. One attempt per call; the request
/// is bounded by `inference.timeout_secs`.
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is unset or the API key environment
    /// variable named by `api_key_env` is missing.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("inference.model required for openai-compatible provider"))?;

        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model,
            api_key,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl InferenceClient for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Inference API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("Invalid inference response: missing choices[0].message.content"))?;

    if content.trim().is_empty() {
        bail!("Inference response was empty");
    }

    Ok(content.trim().to_string())
}

/// Create the configured [`InferenceClient`].
pub fn create_client(config: &InferenceConfig) -> Result<Arc<dyn InferenceClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledInference)),
        "openai-compatible" => Ok(Arc::new(OpenAiCompatibleClient::new(config)?)),
        other => bail!("Unknown inference provider: {}", other),
    }
}
