//! Shared error taxonomy for the assistant pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors surfaced by the extraction, embedding, retrieval, and chat layers.
///
/// Every collaborator failure is propagated immediately to the invoking
/// layer; there are no automatic retries. The interactive loop is the only
/// place that reports an error and keeps going.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The document-analysis collaborator failed or the source PDF is
    /// missing or unreadable. Fatal before any chunking happens.
    #[error("document extraction failed: {0}")]
    Extraction(String),

    /// The embedding collaborator failed, either during a cache build or at
    /// query time. No partial cache is ever written.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The chat collaborator failed; the current turn ends without an
    /// assistant message.
    #[error("chat completion failed: {0}")]
    Chat(String),

    /// A cache file exists but could not be deserialized.
    #[error("embedding cache at {} is corrupt: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    /// A cache file deserialized cleanly but was built from different source
    /// text, chunking parameters, or embedding model.
    #[error(
        "embedding cache at {} is stale (built for a different document, \
         chunking configuration, or model); delete it or rerun with rebuild enabled",
        path.display()
    )]
    CacheStale { path: PathBuf },

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
