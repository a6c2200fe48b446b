//! Chat service orchestrating sessions, memory and answer generation.
//!
//! ChatService coordinates the ChatRepository, the session memory cache and
//! the AnswerGenerator. A chat turn runs under the session's lock:
//! read the transcript, build the context window, generate, persist the turn,
//! then append it to the cache. The turn is written before the cache is
//! touched, so a failed write leaves the cache a faithful mirror of storage.

use medibot_types::chat::{ChatSession, SessionDetail, SessionKey, SessionSummary, Turn, title_from_message};
use medibot_types::error::{ChatError, RepositoryError};
use medibot_types::retrieval::CorpusHandle;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::chat::context::ContextWindowBuilder;
use crate::chat::lock::SessionLocks;
use crate::chat::memory::{SessionMemoryCache, SessionMemoryStore};
use crate::chat::repository::ChatRepository;
use crate::generator::AnswerGenerator;

/// Result of a successful chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: Uuid,
}

/// Orchestrates the chat session lifecycle.
///
/// Generic over its ports to keep medibot-core free of infra dependencies.
pub struct ChatService<C: ChatRepository, G: AnswerGenerator, S: SessionMemoryStore> {
    chat_repo: C,
    generator: G,
    memory: SessionMemoryCache<S>,
    locks: SessionLocks,
    context: ContextWindowBuilder,
    corpus: CorpusHandle,
}

impl<C: ChatRepository, G: AnswerGenerator, S: SessionMemoryStore> ChatService<C, G, S> {
    pub fn new(
        chat_repo: C,
        generator: G,
        memory_store: S,
        context: ContextWindowBuilder,
        corpus: CorpusHandle,
    ) -> Self {
        Self {
            chat_repo,
            generator,
            memory: SessionMemoryCache::new(memory_store),
            locks: SessionLocks::new(),
            context,
            corpus,
        }
    }

    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    pub fn memory(&self) -> &SessionMemoryCache<S> {
        &self.memory
    }

    pub fn corpus(&self) -> &CorpusHandle {
        &self.corpus
    }

    // --- Session lifecycle ---

    /// Create an untitled session and install an empty transcript for it.
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, user_id: Uuid) -> Result<ChatSession, ChatError> {
        let session = self
            .chat_repo
            .create_session(&ChatSession::new(user_id, None))
            .await?;
        self.memory.reset(user_id, session.id);
        info!(session_id = %session.id, "Chat session created");
        Ok(session)
    }

    /// The user's sessions, most recently updated first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.chat_repo.list_sessions(&user_id).await?)
    }

    /// A session and its turns in chronological order.
    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionDetail, ChatError> {
        let session = self.owned_session(user_id, session_id).await?;
        let turns = self.chat_repo.get_turns(&session_id).await?;
        Ok(SessionDetail { session, turns })
    }

    /// Like [`get_session`](Self::get_session), and also rebuilds the
    /// session's memory from storage.
    #[tracing::instrument(skip(self))]
    pub async fn load_session(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionDetail, ChatError> {
        let _guard = self.locks.acquire(SessionKey::new(user_id, session_id)).await;
        let detail = self.get_session(user_id, session_id).await?;
        self.memory.rebuild(user_id, session_id, &detail.turns);
        Ok(detail)
    }

    /// Delete a session with its turns and drop its memory.
    #[tracing::instrument(skip(self))]
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> Result<(), ChatError> {
        let key = SessionKey::new(user_id, session_id);
        let guard = self.locks.acquire(key).await;

        match self.chat_repo.delete_session(&user_id, &session_id).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(ChatError::SessionNotFound),
            Err(e) => return Err(e.into()),
        }
        self.memory.invalidate(user_id, session_id);

        drop(guard);
        self.locks.release(&key);
        info!("Chat session deleted");
        Ok(())
    }

    /// Drop every cached transcript of a user (after the account is deleted).
    pub fn forget_user(&self, user_id: Uuid) {
        self.memory.invalidate_user(user_id);
    }

    // --- Turns ---

    /// Answer `message` in the context of a session.
    ///
    /// Without `session_id` a new session titled after the message is created.
    #[tracing::instrument(skip(self, message, session_id), fields(session_id))]
    pub async fn send_message(
        &self,
        user_id: Uuid,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session = match session_id {
            Some(id) => self.owned_session(user_id, id).await?,
            None => {
                let title = title_from_message(message);
                let session = self
                    .chat_repo
                    .create_session(&ChatSession::new(user_id, Some(title)))
                    .await?;
                self.memory.reset(user_id, session.id);
                session
            }
        };
        tracing::Span::current().record("session_id", tracing::field::display(session.id));

        let _guard = self.locks.acquire(SessionKey::new(user_id, session.id)).await;
        // A delete may have won the lock while this turn was waiting.
        let session = self.owned_session(user_id, session.id).await?;

        let transcript = match self.memory.get(user_id, session.id) {
            Some(transcript) => transcript,
            None => {
                let turns = self.chat_repo.get_turns(&session.id).await?;
                self.memory.get_or_build(user_id, session.id, &turns)
            }
        };

        let prompt = self.context.build(transcript.messages(), message);
        let answer = self
            .generator
            .generate(&prompt, &self.corpus)
            .await
            .inspect_err(|e| error!(error = %e, "Answer generation failed"))?;

        let turn = Turn::new(session.id, user_id, message.to_string(), answer);
        match self.chat_repo.record_turn(&turn).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(ChatError::SessionNotFound),
            Err(e) => {
                error!(error = %e, "Failed to persist chat turn");
                return Err(e.into());
            }
        }
        self.memory.append(user_id, session.id, &turn.message, &turn.response);

        Ok(ChatReply {
            response: turn.response,
            session_id: session.id,
        })
    }

    /// Single-shot answer without history, recorded in a throwaway session.
    #[tracing::instrument(skip(self, message))]
    pub async fn legacy_chat(&self, user_id: Uuid, message: &str) -> Result<String, ChatError> {
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session = self
            .chat_repo
            .create_session(&ChatSession::new(user_id, Some(title_from_message(message))))
            .await?;
        self.memory.reset(user_id, session.id);

        let answer = self
            .generator
            .generate(message, &self.corpus)
            .await
            .inspect_err(|e| error!(error = %e, "Answer generation failed"))?;

        let turn = Turn::new(session.id, user_id, message.to_string(), answer);
        self.chat_repo.record_turn(&turn).await?;
        self.memory.append(user_id, session.id, &turn.message, &turn.response);

        Ok(turn.response)
    }

    async fn owned_session(&self, user_id: Uuid, session_id: Uuid) -> Result<ChatSession, ChatError> {
        self.chat_repo
            .get_session(&user_id, &session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)
    }
}
