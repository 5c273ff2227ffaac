#![doc = "OpenAI-compatible client implementing the content and asset generator traits of pressroom-core."]
//
//! # Generator client
//!
//! [`OpenAiClient`] talks to any OpenAI-compatible API root:
//! - text via `POST {base_url}/chat/completions`, first choice's message content;
//! - images via `POST {base_url}/images/generations` with `response_format=url`,
//!   followed by a GET of the returned URL.
//!
//! Prompt wording, models and sizes come from the config file. Every failure
//! is mapped to the core's per-item error types; nothing here retries.

use async_trait::async_trait;
use pressroom_core::config::{AssetsConfig, GenerationConfig};
use pressroom_core::contract::{AssetGenerator, ContentGenerator};
use pressroom_core::error::{AssetError, GenerationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::load_config::OpenAiCredentials;

/// Per-request ceiling for generation calls.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    generation: GenerationConfig,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    pub fn new(
        credentials: &OpenAiCredentials,
        generation: &GenerationConfig,
        assets: &AssetsConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()?;
        tracing::info!(
            base_url = %credentials.base_url,
            model = %generation.model,
            image_model = %assets.model,
            api_key_set = !credentials.api_key.is_empty(),
            "Initialised OpenAiClient"
        );
        Ok(Self {
            http,
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            generation: generation.clone(),
            image_model: assets.model.clone(),
            image_size: assets.size.clone(),
        })
    }

    fn prompt_for(&self, topic: &str) -> String {
        self.generation.prompt_template.replace("{keyword}", topic)
    }
}

#[async_trait]
impl ContentGenerator for OpenAiClient {
    async fn generate(&self, topic: &str) -> Result<String, GenerationError> {
        tracing::info!(topic, model = %self.generation.model, "Requesting chat completion");
        let request = ChatRequest {
            model: &self.generation.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.generation.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.prompt_for(topic),
                },
            ],
            temperature: self.generation.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::error!(error = ?e, topic, "Chat completion request failed");
                GenerationError::Request(e.to_string())
            })?;

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, topic, "Chat completion response was not understood");
            GenerationError::Request(format!("unexpected response: {e}"))
        })?;

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            tracing::warn!(topic, "Chat completion returned no content");
            return Err(GenerationError::Empty);
        }
        tracing::info!(topic, chars = text.chars().count(), "Chat completion received");
        Ok(text)
    }
}

#[async_trait]
impl AssetGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, target_name: &str) -> Result<Vec<u8>, AssetError> {
        tracing::info!(target_name, model = %self.image_model, "Requesting image generation");
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
            response_format: "url",
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::error!(error = ?e, target_name, "Image generation request failed");
                AssetError::Request(e.to_string())
            })?;

        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| AssetError::Request(format!("unexpected response: {e}")))?;
        let url = body
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| AssetError::Request("response carried no image url".to_string()))?;

        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::error!(error = ?e, target_name, "Image download failed");
                AssetError::Request(e.to_string())
            })?
            .bytes()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))?;

        tracing::info!(target_name, size = bytes.len(), "Image downloaded");
        Ok(bytes.to_vec())
    }
}
