//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and the
//! HTTP server. Services are generic over repository/generator/store traits;
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::ExposeSecret;

use medibot_core::chat::context::ContextWindowBuilder;
use medibot_core::chat::memory::InMemorySessionMemoryStore;
use medibot_core::chat::service::ChatService;
use medibot_core::generator::{GenerationSettings, RagAnswerGenerator};
use medibot_core::identity::IdentityService;
use medibot_core::llm::box_provider::BoxLlmProvider;
use medibot_core::retrieval::box_embedder::BoxEmbedder;
use medibot_core::retrieval::box_index::BoxVectorIndex;
use medibot_infra::config::database_url;
use medibot_infra::identity::google::GoogleIdentityProvider;
use medibot_infra::llm::openai_compat::OpenAiCompatibleProvider;
use medibot_infra::retrieval::UnavailableIndex;
use medibot_infra::retrieval::fastembed::FastEmbedEmbedder;
use medibot_infra::retrieval::pinecone::PineconeIndex;
use medibot_infra::sqlite::chat::SqliteChatRepository;
use medibot_infra::sqlite::pool::DatabasePool;
use medibot_infra::sqlite::user::SqliteUserRepository;
use medibot_types::config::AppConfig;
use medibot_types::retrieval::CorpusHandle;

use crate::http::session::SessionTokens;

/// Signing key used when `SECRET_KEY` is not configured.
const DEV_SECRET_KEY: &str = "medibot-dev-secret-change-me";

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteChatRepository, RagAnswerGenerator, InMemorySessionMemoryStore>;

pub type ConcreteIdentityService = IdentityService<SqliteUserRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chat_service: Arc<ConcreteChatService>,
    pub identity_service: Arc<ConcreteIdentityService>,
    /// `None` when Google client credentials are missing; login then fails closed.
    pub identity_provider: Option<Arc<GoogleIdentityProvider>>,
    pub session_tokens: Arc<SessionTokens>,
    pub embedder: FastEmbedEmbedder,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Connect to the database and wire services from a loaded config.
    pub async fn from_config(config: AppConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&config, &data_dir)).await?;

        // Answer generator: local embeddings -> vector index -> LLM
        let embedder = FastEmbedEmbedder::new(data_dir.join("models"));
        let index = match PineconeIndex::from_config(&config.retrieval) {
            Ok(index) => BoxVectorIndex::new(index),
            Err(err) => {
                tracing::warn!("Vector index unavailable: {err}");
                BoxVectorIndex::new(UnavailableIndex::new(err.to_string()))
            }
        };
        if config.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured (OPENROUTER_API_KEY); chat requests will fail");
        }
        let llm = BoxLlmProvider::new(OpenAiCompatibleProvider::from_app_config(&config.llm));
        tracing::info!(
            provider = llm.name(),
            model = %config.llm.model,
            max_context_tokens = llm.capabilities().max_context_tokens,
            max_output_tokens = llm.capabilities().max_output_tokens,
            "LLM provider configured"
        );

        let generator = RagAnswerGenerator::new(
            BoxEmbedder::new(embedder.clone()),
            index,
            llm,
            GenerationSettings {
                model: config.llm.model.clone(),
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
                prompt: config.prompt.clone(),
            },
        );

        let corpus = CorpusHandle {
            index: config.retrieval.index_name.clone(),
            namespace: config.retrieval.namespace.clone(),
            top_k: config.retrieval.top_k,
        };

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            generator,
            InMemorySessionMemoryStore::new(),
            ContextWindowBuilder::new(&config.context),
            corpus,
        );

        let identity_service = IdentityService::new(SqliteUserRepository::new(db_pool));

        let identity_provider =
            match GoogleIdentityProvider::from_config(&config.auth, &config.server.public_url) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(err) => {
                    tracing::warn!("Google sign-in disabled: {err}");
                    None
                }
            };

        let session_tokens = match &config.auth.secret_key {
            Some(key) => SessionTokens::new(key.expose_secret().as_bytes(), config.auth.session_ttl_secs),
            None => {
                tracing::warn!("SECRET_KEY is not set; using an insecure development key");
                SessionTokens::new(DEV_SECRET_KEY.as_bytes(), config.auth.session_ttl_secs)
            }
        }
        .with_secure_cookies(config.server.public_url.starts_with("https://"));

        Ok(Self {
            config: Arc::new(config),
            chat_service: Arc::new(chat_service),
            identity_service: Arc::new(identity_service),
            identity_provider,
            session_tokens: Arc::new(session_tokens),
            embedder,
            data_dir,
        })
    }
}
