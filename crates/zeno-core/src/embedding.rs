//! Embedding provider abstraction.
//!
//! [`OpenAiEmbeddings`] calls the OpenAI embeddings API; requests are a
//! single attempt with a timeout, since retry policy belongs to the sync
//! outbox rather than request paths. [`UnconfiguredEmbeddings`] stands in when no API
//! key is present so dependent requests fail with a 5xx instead of the
//! process refusing to start.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use zeno_types::EMBEDDING_DIMS;

use crate::{Result, ZenoError};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;
    fn dims(&self) -> usize;
    fn is_configured(&self) -> bool {
        true
    }
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// OpenAI embeddings client.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        EMBEDDING_DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let resp = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "openai",
                message: format!("{status}: {body}"),
            });
        }

        let mut parsed: EmbeddingsResponse = resp.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(ZenoError::Upstream {
                service: "openai",
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.data.len()
                ),
            });
        }

        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

/// Placeholder provider for deployments without an API key.
pub struct UnconfiguredEmbeddings;

#[async_trait]
impl EmbeddingProvider for UnconfiguredEmbeddings {
    fn model_name(&self) -> &str {
        "unconfigured"
    }

    fn dims(&self) -> usize {
        0
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(ZenoError::MissingCredential("OPENAI_API_KEY"))
    }
}
