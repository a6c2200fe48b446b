//! Pinecone vector index client.
//!
//! Implements `VectorIndex` against the Pinecone data-plane `POST /query`
//! endpoint. Each corpus chunk is stored with its text under the `text`
//! metadata key.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use medibot_core::retrieval::index::VectorIndex;
use medibot_types::config::RetrievalConfig;
use medibot_types::error::RetrievalError;
use medibot_types::retrieval::{CorpusHandle, RetrievedDocument};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pinecone REST API version sent with every request.
const API_VERSION: &str = "2025-04";

/// Metadata key holding the chunk text.
const TEXT_METADATA_KEY: &str = "text";

const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl QueryMatch {
    /// Chunks without a text payload carry nothing to ground an answer on.
    fn into_document(self) -> Option<RetrievedDocument> {
        let content = self
            .metadata?
            .get(TEXT_METADATA_KEY)?
            .as_str()?
            .to_string();

        Some(RetrievedDocument {
            id: self.id,
            content,
            score: self.score,
        })
    }
}

fn parse_matches(body: QueryResponse) -> Vec<RetrievedDocument> {
    body.matches
        .into_iter()
        .filter_map(QueryMatch::into_document)
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for a single Pinecone index host.
///
/// Does NOT derive Debug: holds the API key.
pub struct PineconeIndex {
    host: String,
    api_key: SecretString,
    http: reqwest::Client,
}

impl PineconeIndex {
    /// `host` is the index host shown in the Pinecone console, with or
    /// without a scheme (e.g. `medical-chatbot-abc123.svc.pinecone.io`).
    pub fn new(host: &str, api_key: SecretString) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("medibot/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            host: normalize_host(host),
            api_key,
            http,
        }
    }

    /// Build a client from the `[retrieval]` section. Host and API key are required.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let host = config
            .index_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                RetrievalError::NotConfigured("PINECONE_INDEX_HOST is not set".to_string())
            })?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            RetrievalError::NotConfigured("PINECONE_API_KEY is not set".to_string())
        })?;

        Ok(Self::new(host, api_key))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.host)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        corpus: &CorpusHandle,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let body = QueryRequest {
            vector,
            top_k: corpus.top_k,
            include_metadata: true,
            namespace: corpus.namespace.as_deref(),
        };

        let response = self
            .http
            .post(self.query_url())
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Index(format!("{}: {e}", corpus.index)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Index(format!(
                "{} returned {status}: {text}",
                corpus.index
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Index(format!("invalid query response: {e}")))?;

        let documents = parse_matches(parsed);
        debug!(index = %corpus.index, hits = documents.len(), "vector query complete");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let vector = [0.1_f32, 0.2];
        let body = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
            namespace: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());

        let body = QueryRequest {
            namespace: Some("drugs"),
            ..body
        };
        assert_eq!(serde_json::to_value(&body).unwrap()["namespace"], "drugs");
    }

    #[test]
    fn test_parse_matches_keeps_text_chunks_in_order() {
        let raw = r#"{
            "matches": [
                {"id": "a", "score": 0.91, "metadata": {"text": "Acne is a skin condition.", "page": 12}},
                {"id": "b", "score": 0.80, "metadata": {"source": "book.pdf"}},
                {"id": "c", "score": 0.75},
                {"id": "d", "score": 0.70, "metadata": {"text": "Treatment options include..."}}
            ],
            "namespace": ""
        }"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        let docs = parse_matches(parsed);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].content, "Acne is a skin condition.");
        assert!((docs[0].score - 0.91).abs() < 1e-6);
        assert_eq!(docs[1].id, "d");
    }

    #[test]
    fn test_parse_empty_response() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_matches(parsed).is_empty());
    }

    #[test]
    fn test_from_config_requires_host_and_key() {
        let mut config = RetrievalConfig::default();
        assert!(matches!(
            PineconeIndex::from_config(&config),
            Err(RetrievalError::NotConfigured(_))
        ));

        config.index_host = Some("idx.svc.pinecone.io".to_string());
        assert!(PineconeIndex::from_config(&config).is_err());

        config.api_key = Some(SecretString::from("pc-key"));
        let index = PineconeIndex::from_config(&config).unwrap();
        assert_eq!(index.host(), "https://idx.svc.pinecone.io");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("idx-abc.svc.pinecone.io"),
            "https://idx-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
        let index = PineconeIndex::new("idx.svc.pinecone.io", SecretString::from("k"));
        assert_eq!(index.query_url(), "https://idx.svc.pinecone.io/query");
    }
}
