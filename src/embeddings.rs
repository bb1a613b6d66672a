//! Embedding collaborator: trait, HTTP client, and a deterministic mock.
//!
//! The provider is invoked once per chunk during a cache build and once per
//! query at ask time. Vectors for a given model share one dimensionality;
//! the store relies on that.

use std::hash::Hasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::types::{AssistantError, Result};

/// External embedding collaborator.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds one text span into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Identifier of the model behind this provider; recorded in the cache
    /// so a model switch invalidates it.
    fn model_id(&self) -> &str;
}

/// Client for an OpenAI-compatible `/embeddings` deployment route.
pub struct OpenAiEmbeddings {
    endpoint: Url,
    api_key: String,
    api_version: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    pub fn new(
        endpoint: Url,
        api_key: String,
        api_version: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            api_key,
            api_version,
            model,
            client,
        })
    }

    fn request_url(&self) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(&format!("openai/deployments/{}/embeddings", self.model))
            .map_err(|err| AssistantError::Config(format!("invalid embedding endpoint: {err}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.model,
        };
        let response = self
            .client
            .post(self.request_url()?)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| AssistantError::Embedding(format!("malformed response: {err}")))?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AssistantError::Embedding("response carried no embedding".into()))?;
        debug!(dims = vector.len(), "embedded text span");
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Deterministic in-process provider for tests and offline runs.
///
/// Vectors are derived from a hash of the input text, so identical text
/// always embeds identically and distinct text almost always differs.
pub struct MockEmbeddingProvider {
    dims: usize,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub const DEFAULT_DIMS: usize = 8;

    pub fn new() -> Self {
        Self::with_dims(Self::DEFAULT_DIMS)
    }

    pub fn with_dims(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = Vec::with_capacity(self.dims);
        for lane in 0..self.dims {
            let mut hasher = FxHasher::default();
            hasher.write(text.as_bytes());
            hasher.write_usize(lane);
            // Map the hash onto [-1, 1] so cosine scores look realistic.
            let unit = (hasher.finish() % 2_000_001) as f32 / 1_000_000.0 - 1.0;
            vector.push(unit);
        }
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        "mock-embeddings"
    }
}
