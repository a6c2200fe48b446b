//! Application configuration types for Medibot.
//!
//! `AppConfig` represents the top-level `config.toml` in the data directory.
//! Every section and field has a default, so an empty file (or no file) is a
//! valid configuration. Deployment values and secrets are usually supplied
//! through environment overrides applied by the infra loader.
//!
//! Sections holding secrets derive `Deserialize` only: `SecretString` cannot
//! be serialized back out.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the Medibot server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL, used to build the OAuth redirect URI.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Optional directory of static assets served under `/static`.
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_public_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            static_dir: None,
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL. When unset, `{data_dir}/medibot.db` is used.
    #[serde(default)]
    pub url: Option<String>,
}

/// Session-cookie signing and identity provider credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Key used to sign session tokens.
    #[serde(default)]
    pub secret_key: Option<SecretString>,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default)]
    pub google_client_secret: Option<SecretString>,
}

fn default_session_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            session_ttl_secs: default_session_ttl_secs(),
            google_client_id: None,
            google_client_secret: None,
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_llm_model() -> String {
    "mistralai/mistral-small-3.2-24b-instruct:free".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// Hosted vector index the answer generator searches.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// Data-plane host of the index (e.g. `https://medical-chatbot-xxxx.svc.pinecone.io`).
    #[serde(default)]
    pub index_host: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_index_name() -> String {
    "medical-chatbot".to_string()
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            index_host: None,
            namespace: None,
            api_key: None,
            top_k: default_top_k(),
        }
    }
}

/// Context window shaping for follow-up questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Number of most recent transcript messages carried into the prompt.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
    #[serde(default = "default_context_header")]
    pub header: String,
    #[serde(default = "default_context_instruction")]
    pub instruction: String,
}

fn default_max_history_messages() -> usize {
    10
}

fn default_context_header() -> String {
    "Conversation History".to_string()
}

fn default_context_instruction() -> String {
    "Please provide a helpful answer considering the conversation history above.".to_string()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_history_messages: default_max_history_messages(),
            header: default_context_header(),
            instruction: default_context_instruction(),
        }
    }
}

/// Answer-length instruction carried in the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_min_answer_sentences")]
    pub min_answer_sentences: u32,
    #[serde(default = "default_max_answer_sentences")]
    pub max_answer_sentences: u32,
}

fn default_min_answer_sentences() -> u32 {
    3
}

fn default_max_answer_sentences() -> u32 {
    5
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            min_answer_sentences: default_min_answer_sentences(),
            max_answer_sentences: default_max_answer_sentences(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Export spans through the OpenTelemetry stdout exporter.
    #[serde(default)]
    pub otel: bool,
}
