pub mod openai_compat;

use anyhow::{Context, Result};

use crate::config::settings::LlmConfig;
use openai_compat::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Moonshot,
    OpenRouter,
}

impl LlmProvider {
    pub fn from_provider(provider: &str) -> Option<Self> {
        match provider.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "moonshot" => Some(Self::Moonshot),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Moonshot => "https://api.moonshot.ai/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Only OpenAI accepts the `developer` role; the others get `system`.
    pub fn instruction_role(&self) -> &'static str {
        match self {
            Self::OpenAI => "developer",
            Self::Moonshot | Self::OpenRouter => "system",
        }
    }
}

/// A model that can answer under a JSON-schema constraint
#[allow(async_fn_in_trait)]
pub trait StructuredLlm {
    async fn complete_json(
        &self,
        instructions: &str,
        prompt: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<String>;
}

/// Chat-completions client resolved from [`LlmConfig`]
pub struct ChatClient {
    provider: LlmProvider,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = LlmProvider::from_provider(&config.provider)
            .with_context(|| format!("Invalid LLM provider specified: {}", config.provider))?;
        let api_key = config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .context("LLM API key not configured (set OPENAI_API_KEY)")?;

        Ok(Self {
            provider,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| provider.base_url().to_string()),
            api_key: api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl StructuredLlm for ChatClient {
    async fn complete_json(
        &self,
        instructions: &str,
        prompt: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let messages = vec![
            ChatMessage::new(self.provider.instruction_role(), instructions),
            ChatMessage::new("user", prompt),
        ];
        let format = openai_compat::json_schema_format(schema_name, schema);

        openai_compat::complete(
            &self.base_url,
            &self.api_key,
            &self.model,
            messages,
            Some(format),
        )
        .await
    }
}
