//! AI Provider Clients
//!
//! Providers are chosen from configuration by `create_provider`. Optional
//! features are exposed as capability traits: a caller asks the provider for
//! the capability and gets `None` when it is not supported.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::error::{SolderlineError, SolderlineResult};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A single free-form prompt
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformPrompt {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl FreeformPrompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Capability: answer an arbitrary prompt with text
#[async_trait]
pub trait SupportsFreeformPrompt: Send + Sync {
    async fn complete(&self, prompt: &FreeformPrompt) -> SolderlineResult<String>;
}

/// An AI backend
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> Option<&str> {
        None
    }

    /// Free-form prompting, when this provider offers it
    fn freeform(&self) -> Option<&dyn SupportsFreeformPrompt> {
        None
    }
}

/// Builds the provider named by `config.provider`
pub fn create_provider(config: &AiConfig) -> SolderlineResult<Box<dyn AiProvider>> {
    let provider: Box<dyn AiProvider> = match config.provider.trim().to_lowercase().as_str() {
        "openai" => Box::new(OpenAiProvider::new(config)?),
        "anthropic" => Box::new(AnthropicProvider::new(config)?),
        "disabled" | "none" | "" => Box::new(DisabledProvider),
        other => {
            return Err(SolderlineError::configuration(format!("Unknown AI provider: {}", other)));
        }
    };

    tracing::debug!(provider = provider.name(), model = ?provider.model(), "AI provider configured");
    Ok(provider)
}

fn http_client(config: &AiConfig, provider: &str) -> SolderlineResult<Client> {
    if config.api_key.trim().is_empty() {
        return Err(SolderlineError::configuration(format!("{} API key is not set", provider)));
    }

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|e| SolderlineError::configuration(format!("Failed to create HTTP client: {}", e)))
}

async fn error_body(service: &str, response: reqwest::Response) -> SolderlineError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    tracing::error!(service, %status, "AI API error: {}", error_text);
    SolderlineError::external_service(service, format!("{}: {}", status, error_text))
}

/// Provider with every capability switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProvider;

impl AiProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }
}

/// OpenAI-compatible chat completions
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &AiConfig) -> SolderlineResult<Self> {
        let api_url = if config.api_url.trim().is_empty() {
            OPENAI_API_URL.to_string()
        } else {
            config.api_url.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client: http_client(config, "OpenAI")?,
            api_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn freeform(&self) -> Option<&dyn SupportsFreeformPrompt> {
        Some(self)
    }
}

#[async_trait]
impl SupportsFreeformPrompt for OpenAiProvider {
    async fn complete(&self, prompt: &FreeformPrompt) -> SolderlineResult<String> {
        let mut messages = Vec::new();
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.user.clone(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: prompt.max_tokens.unwrap_or(self.max_tokens),
            temperature: prompt.temperature.unwrap_or(self.temperature),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_body("openai", response).await);
        }

        let result: ChatResponse = response.json().await?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SolderlineError::external_service("openai", "No response content"))
    }
}

/// Anthropic messages API
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicProvider {
    pub fn new(config: &AiConfig) -> SolderlineResult<Self> {
        let api_url = match config.api_url.trim() {
            "" | OPENAI_API_URL => ANTHROPIC_API_URL.to_string(),
            url => url.trim_end_matches('/').to_string(),
        };

        Ok(Self {
            client: http_client(config, "Anthropic")?,
            api_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn freeform(&self) -> Option<&dyn SupportsFreeformPrompt> {
        Some(self)
    }
}

#[async_trait]
impl SupportsFreeformPrompt for AnthropicProvider {
    async fn complete(&self, prompt: &FreeformPrompt) -> SolderlineResult<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: prompt.max_tokens.unwrap_or(self.max_tokens),
            system: prompt.system.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
            temperature: prompt.temperature.unwrap_or(self.temperature),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_body("anthropic", response).await);
        }

        let result: AnthropicResponse = response.json().await?;

        let text: Vec<String> = result
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(SolderlineError::external_service("anthropic", "Empty response"));
        }
        Ok(text.join(""))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, api_key: &str) -> AiConfig {
        AiConfig {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_disabled_provider_has_no_capabilities() {
        let provider = create_provider(&AiConfig::default()).unwrap();
        assert_eq!(provider.name(), "disabled");
        assert!(provider.freeform().is_none());
        assert!(provider.model().is_none());
    }

    #[test]
    fn test_factory_builds_configured_provider() {
        let provider = create_provider(&config("OpenAI", "sk-test")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), Some("gpt-4o"));
        assert!(provider.freeform().is_some());

        let provider = create_provider(&config("anthropic", "key")).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert!(provider.freeform().is_some());
    }

    #[test]
    fn test_factory_errors() {
        let err = create_provider(&config("openai", "")).err().unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");

        let err = create_provider(&config("watson", "key")).err().unwrap();
        assert!(err.to_string().contains("watson"));
    }

    #[test]
    fn test_anthropic_default_url() {
        let provider = AnthropicProvider::new(&config("anthropic", "key")).unwrap();
        assert_eq!(provider.api_url, ANTHROPIC_API_URL);
    }
}
