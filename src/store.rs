//! Embedding store: build-or-load of the chunk/vector cache.
//!
//! The cache is one JSON blob holding every record in chunk order, written
//! in a single pass after all chunks embed successfully. A failed build
//! leaves nothing behind; a retry recomputes from scratch. The file carries
//! a fingerprint of the source text and chunking parameters plus the model
//! id, so a cache built for different inputs is detected instead of being
//! silently reused.

use std::hash::Hasher;
use std::path::Path;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::embeddings::EmbeddingProvider;
use crate::types::{AssistantError, Result};

/// How many embedding requests may be in flight during a cache build.
/// Output ordering is preserved regardless.
pub const EMBED_CONCURRENCY: usize = 4;

/// One chunk paired with its embedding vector. Order within the store
/// matches the chunk sequence; all vectors share one dimensionality.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// On-disk shape of the embedding cache.
#[derive(Serialize, Deserialize)]
struct CacheFile {
    fingerprint: u64,
    model: String,
    records: Vec<EmbeddingRecord>,
}

/// Outcome of probing the cache file, distinguishing the four states the
/// caller reacts to differently.
pub enum CacheStatus {
    /// No file at the path; a build is required.
    Absent,
    /// The file exists but did not deserialize.
    Corrupt(String),
    /// The file deserialized but was built from other text, another chunking
    /// configuration, or another model.
    Stale,
    /// The file matches; records are returned verbatim.
    Valid(Vec<EmbeddingRecord>),
}

/// Fingerprint of the inputs the cache depends on: the full source text and
/// the chunking budget. Deterministic across runs.
pub fn cache_fingerprint(text: &str, max_tokens: usize) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.write_usize(max_tokens);
    hasher.finish()
}

/// Probes the cache file and classifies it against the expected fingerprint
/// and model.
pub async fn load_cache(path: &Path, fingerprint: u64, model: &str) -> Result<CacheStatus> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(CacheStatus::Absent),
        Err(err) => return Err(err.into()),
    };

    let cache: CacheFile = match serde_json::from_str(&raw) {
        Ok(cache) => cache,
        Err(err) => return Ok(CacheStatus::Corrupt(err.to_string())),
    };

    if cache.fingerprint != fingerprint || cache.model != model {
        return Ok(CacheStatus::Stale);
    }
    Ok(CacheStatus::Valid(cache.records))
}

/// Returns the cached records when the cache is valid, otherwise embeds
/// every chunk in order and persists the full result in one write.
///
/// A corrupt cache is always an error; a stale one is an error unless
/// `rebuild_on_stale` is set, in which case it is replaced. Any embedding
/// failure aborts the build with nothing written.
pub async fn build_or_load(
    chunks: &[String],
    path: &Path,
    fingerprint: u64,
    provider: &dyn EmbeddingProvider,
    rebuild_on_stale: bool,
) -> Result<Vec<EmbeddingRecord>> {
    match load_cache(path, fingerprint, provider.model_id()).await? {
        CacheStatus::Valid(records) => {
            info!(path = %path.display(), records = records.len(), "loaded embedding cache");
            return Ok(records);
        }
        CacheStatus::Corrupt(reason) => {
            return Err(AssistantError::CacheCorrupt {
                path: path.to_path_buf(),
                reason,
            });
        }
        CacheStatus::Stale if !rebuild_on_stale => {
            return Err(AssistantError::CacheStale {
                path: path.to_path_buf(),
            });
        }
        CacheStatus::Stale => {
            warn!(path = %path.display(), "embedding cache is stale, rebuilding");
        }
        CacheStatus::Absent => {
            info!(path = %path.display(), chunks = chunks.len(), "building embedding cache");
        }
    }

    let records = embed_chunks(chunks, provider).await?;

    let cache = CacheFile {
        fingerprint,
        model: provider.model_id().to_string(),
        records,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, serde_json::to_string(&cache)?).await?;
    info!(path = %path.display(), records = cache.records.len(), "embedding cache written");
    Ok(cache.records)
}

/// Embeds all chunks with bounded in-flight concurrency, preserving chunk
/// order in the output.
async fn embed_chunks(
    chunks: &[String],
    provider: &dyn EmbeddingProvider,
) -> Result<Vec<EmbeddingRecord>> {
    stream::iter(chunks.iter().map(|chunk| async move {
        let embedding = provider.embed(chunk).await?;
        Ok::<_, AssistantError>(EmbeddingRecord {
            content: chunk.clone(),
            embedding,
        })
    }))
    .buffered(EMBED_CONCURRENCY)
    .try_collect()
    .await
}
