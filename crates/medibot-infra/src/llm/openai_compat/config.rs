//! Configuration types and per-provider defaults for OpenAI-compatible providers.
//!
//! Each provider that speaks the OpenAI chat completions protocol gets a factory
//! function returning an [`OpenAiCompatConfig`] with the correct base URL,
//! capabilities, and defaults.

use medibot_types::config::LlmConfig;
use medibot_types::llm::ProviderCapabilities;
use secrecy::{ExposeSecret, SecretString};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openrouter", "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1").
    pub base_url: String,
    /// API key for authentication.
    pub api_key: SecretString,
    /// Model identifier (e.g., "mistralai/mistral-small-3.2-24b-instruct:free").
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

/// OpenRouter default configuration.
///
/// Base URL: `https://openrouter.ai/api/v1`
/// Capabilities: 128K context, 8K output (conservative across routed models).
pub fn openrouter_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openrouter".into(),
        base_url: OPENROUTER_BASE_URL.into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            max_context_tokens: 128_000,
            max_output_tokens: 8_192,
        },
    }
}

/// OpenAI default configuration.
///
/// Base URL: `https://api.openai.com/v1`
/// Capabilities: 128K context, 16K output.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        },
    }
}

/// Build a provider config from the `[llm]` section.
///
/// Known base URLs pick up their provider's defaults; anything else is treated
/// as a generic OpenAI-compatible server named after its host.
pub fn from_app_config(config: &LlmConfig) -> OpenAiCompatConfig {
    let api_key = config
        .api_key
        .clone()
        .unwrap_or_else(|| SecretString::from(""));
    let base_url = config.base_url.trim_end_matches('/');

    let mut resolved = match base_url {
        OPENROUTER_BASE_URL => openrouter_defaults(api_key, &config.model),
        OPENAI_BASE_URL => openai_defaults(api_key, &config.model),
        other => OpenAiCompatConfig {
            provider_name: reqwest::Url::parse(other)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| "openai_compatible".to_string()),
            base_url: other.to_string(),
            api_key,
            model: config.model.clone(),
            capabilities: ProviderCapabilities {
                max_context_tokens: 32_000,
                max_output_tokens: 4_096,
            },
        },
    };
    resolved.capabilities.max_output_tokens = resolved.capabilities.max_output_tokens.max(config.max_tokens);
    resolved
}

impl OpenAiCompatConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}
