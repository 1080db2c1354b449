use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;

/// Text-generation service used by the pipeline
pub trait TextGenerator {
    /// Send one system + user prompt pair and return the reply text
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

impl<T: TextGenerator> TextGenerator for &T {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        (**self).generate(system, user)
    }
}

impl<T: TextGenerator> TextGenerator for Arc<T> {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        (**self).generate(system, user)
    }
}

/// Which LLM API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
}

impl Provider {
    fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }
}

/// Configuration for the generation API client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    /// API key (from OPENAI_API_KEY or ANTHROPIC_API_KEY)
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o")
    pub model: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl LlmConfig {
    /// Create config from environment variables
    pub fn from_env(provider: Provider) -> Result<Self> {
        let var = provider.api_key_var();
        let api_key = std::env::var(var)
            .with_context(|| format!("{} environment variable not set", var))?;
        Self::new(provider, api_key)
    }

    /// Create with an explicit key and provider defaults
    pub fn new(provider: Provider, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("{} API key is empty", provider.name());
        }

        Ok(Self {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            request_timeout: Duration::from_secs(120),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

/// Client for whichever provider the config names
pub enum LlmClient {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(match config.provider {
            Provider::OpenAi => LlmClient::OpenAi(OpenAiClient::new(config)?),
            Provider::Anthropic => LlmClient::Anthropic(AnthropicClient::new(config)?),
        })
    }
}

impl TextGenerator for LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        match self {
            LlmClient::OpenAi(client) => client.generate(system, user).await,
            LlmClient::Anthropic(client) => client.generate(system, user).await,
        }
    }
}

/// OpenAI Chat Completions client
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }
}

impl TextGenerator for OpenAiClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        const PROVIDER: &str = "OpenAI";

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        debug!(model = %self.config.model, "sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| GenerationError::Request {
                provider: PROVIDER,
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let response: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|source| GenerationError::Request {
                    provider: PROVIDER,
                    source,
                })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::NoContent(PROVIDER))
    }
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }
}

impl TextGenerator for AnthropicClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        const PROVIDER: &str = "Anthropic";

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        debug!(model = %self.config.model, "sending messages request");

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|source| GenerationError::Request {
                provider: PROVIDER,
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let response: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|source| GenerationError::Request {
                    provider: PROVIDER,
                    source,
                })?;

        // Extract text from the first content block
        response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or(GenerationError::NoContent(PROVIDER))
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
