//! Answer generation: retrieval-augmented completion.
//!
//! `RagAnswerGenerator` embeds the prompt, pulls the nearest documents from
//! the hosted index, stuffs them into a system prompt and asks the LLM for an
//! answer. The prompt given to `generate` is already context-enriched by the
//! chat service, and is used verbatim both as the retrieval query and as the
//! user message.

use medibot_types::config::PromptConfig;
use medibot_types::error::GeneratorError;
use medibot_types::llm::{CompletionRequest, Message, MessageRole};
use medibot_types::retrieval::{CorpusHandle, RetrievedDocument};

use crate::llm::box_provider::BoxLlmProvider;
use crate::retrieval::box_embedder::BoxEmbedder;
use crate::retrieval::box_index::BoxVectorIndex;

/// Separator between retrieved documents in the system prompt.
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Produces a natural-language answer for a prompt.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait AnswerGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        corpus: &CorpusHandle,
    ) -> impl std::future::Future<Output = Result<String, GeneratorError>> + Send;
}

/// Model settings applied to every completion request.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub prompt: PromptConfig,
}

/// Render the system prompt around the retrieved documents.
pub fn build_system_prompt(config: &PromptConfig, documents: &[RetrievedDocument]) -> String {
    let context = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR);

    format!(
        "You are a medical assistant for question-answering tasks. \
         Use the following pieces of retrieved context to answer the question. \
         If you don't know the answer, say that you don't know. \
         Use {} to {} sentences and keep the answer concise.\n\n{context}",
        config.min_answer_sentences, config.max_answer_sentences
    )
}

/// Embed, retrieve, then complete.
pub struct RagAnswerGenerator {
    embedder: BoxEmbedder,
    index: BoxVectorIndex,
    llm: BoxLlmProvider,
    settings: GenerationSettings,
}

impl RagAnswerGenerator {
    pub fn new(
        embedder: BoxEmbedder,
        index: BoxVectorIndex,
        llm: BoxLlmProvider,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    fn completion_request(&self, prompt: &str, documents: &[RetrievedDocument]) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message {
                role: MessageRole::User,
                content: prompt.to_string(),
            }],
            system: Some(build_system_prompt(&self.settings.prompt, documents)),
            max_tokens: self
                .settings
                .max_tokens
                .min(self.llm.capabilities().max_output_tokens),
            temperature: self.settings.temperature,
        }
    }
}

impl AnswerGenerator for RagAnswerGenerator {
    #[tracing::instrument(skip_all, fields(index = %corpus.index, top_k = corpus.top_k))]
    async fn generate(&self, prompt: &str, corpus: &CorpusHandle) -> Result<String, GeneratorError> {
        let vector = self.embedder.embed_one(prompt).await?;
        let documents = self.index.query(&vector, corpus).await?;
        tracing::debug!(documents = documents.len(), "Retrieved context documents");

        let request = self.completion_request(prompt, &documents);
        let response = self.llm.complete(&request).await?;
        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "LLM completion finished"
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use medibot_types::error::RetrievalError;
    use medibot_types::llm::{
        CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
    };

    use crate::llm::provider::LlmProvider;
    use crate::retrieval::embedder::Embedder;
    use crate::retrieval::index::VectorIndex;

    struct MockEmbedder;

    impl Embedder for MockEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }

        fn model_name(&self) -> &str {
            "mock-embedder"
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct MockIndex {
        documents: Vec<RetrievedDocument>,
        fail: bool,
    }

    impl VectorIndex for MockIndex {
        async fn query(
            &self,
            _vector: &[f32],
            corpus: &CorpusHandle,
        ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
            if self.fail {
                return Err(RetrievalError::Index("unavailable".to_string()));
            }
            Ok(self.documents.iter().take(corpus.top_k).cloned().collect())
        }
    }

    struct RecordingProvider {
        capabilities: ProviderCapabilities,
        seen: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: "Drink fluids and rest.".to_string(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn doc(id: &str, content: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: id.to_string(),
            content: content.to_string(),
            score: 0.9,
        }
    }

    fn corpus(top_k: usize) -> CorpusHandle {
        CorpusHandle {
            index: "medical-chatbot".to_string(),
            namespace: None,
            top_k,
        }
    }

    fn generator(fail_index: bool) -> (RagAnswerGenerator, Arc<Mutex<Vec<CompletionRequest>>>) {
        generator_with_max_tokens(fail_index, 256)
    }

    fn generator_with_max_tokens(
        fail_index: bool,
        max_tokens: u32,
    ) -> (RagAnswerGenerator, Arc<Mutex<Vec<CompletionRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let generator = RagAnswerGenerator::new(
            BoxEmbedder::new(MockEmbedder),
            BoxVectorIndex::new(MockIndex {
                documents: vec![doc("1", "Fever is a rise in body temperature."), doc("2", "Rest helps."), doc("3", "Unused.")],
                fail: fail_index,
            }),
            BoxLlmProvider::new(RecordingProvider {
                capabilities: ProviderCapabilities {
                    max_context_tokens: 32_000,
                    max_output_tokens: 4_096,
                },
                seen: Arc::clone(&seen),
            }),
            GenerationSettings {
                model: "test-model".to_string(),
                max_tokens,
                temperature: None,
                prompt: PromptConfig::default(),
            },
        );
        (generator, seen)
    }

    #[test]
    fn system_prompt_joins_documents_and_sentence_bounds() {
        let prompt = build_system_prompt(
            &PromptConfig::default(),
            &[doc("1", "alpha"), doc("2", "beta")],
        );
        assert!(prompt.contains("Use 3 to 5 sentences"));
        assert!(prompt.ends_with("\n\nalpha\n\nbeta"));
    }

    #[tokio::test]
    async fn generate_stuffs_top_k_documents_and_passes_prompt_verbatim() {
        let (generator, seen) = generator(false);
        let answer = generator.generate("What is fever?", &corpus(2)).await.unwrap();
        assert_eq!(answer, "Drink fluids and rest.");

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.max_tokens, 256);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "What is fever?");

        let system = request.system.as_deref().unwrap();
        assert!(system.contains("Fever is a rise in body temperature."));
        assert!(system.contains("Rest helps."));
        assert!(!system.contains("Unused."));
    }

    #[tokio::test]
    async fn retrieval_failure_skips_llm() {
        let (generator, seen) = generator(true);
        let err = generator.generate("q", &corpus(3)).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Retrieval(RetrievalError::Index(_))));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_tokens_is_capped_by_provider_output_limit() {
        let (generator, seen) = generator_with_max_tokens(false, 10_000);
        generator.generate("q", &corpus(1)).await.unwrap();
        assert_eq!(seen.lock().unwrap()[0].max_tokens, 4_096);
    }
}
