//! Environment-driven configuration for the assistant binary.
//!
//! Secrets and endpoints come from the environment (a `.env` file is honored
//! via `dotenvy`); everything else has a default matching the original
//! deployment of this pipeline.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::chunking::DEFAULT_MAX_TOKENS;
use crate::retrieval::DEFAULT_TOP_K;
use crate::types::{AssistantError, Result};

/// System instruction for the retrieval-augmented session.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant for the vehicle owner's manual. Answer using the \
     provided manual context when it is relevant.";

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Document-analysis service endpoint.
    pub docintel_endpoint: Url,
    pub docintel_key: String,
    /// OpenAI-compatible service endpoint hosting both deployments.
    pub openai_endpoint: Url,
    pub openai_key: String,
    pub openai_api_version: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub pdf_path: PathBuf,
    pub extracted_text_path: PathBuf,
    pub embeddings_cache_path: PathBuf,
    pub max_tokens: usize,
    pub top_k: usize,
    pub request_timeout: Duration,
    /// Replace a stale embedding cache instead of refusing to start.
    pub rebuild_stale_cache: bool,
    /// Serve plain windowed chat instead of retrieval-augmented turns.
    pub plain_chat: bool,
}

impl AssistantConfig {
    /// Loads configuration from the process environment.
    ///
    /// Missing required values (endpoints, keys) and malformed numbers are
    /// reported as [`AssistantError::Config`], never panics.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            docintel_endpoint: required_url("DOCINTEL_ENDPOINT")?,
            docintel_key: required("DOCINTEL_KEY")?,
            openai_endpoint: required_url("OPENAI_ENDPOINT")?,
            openai_key: required("OPENAI_KEY")?,
            openai_api_version: var_or("OPENAI_API_VERSION", "2024-12-01-preview"),
            embedding_model: var_or("EMBEDDING_MODEL", "text-embedding-3-large"),
            chat_model: var_or("CHAT_MODEL", "o4-mini"),
            pdf_path: PathBuf::from(var_or("MANUAL_PDF_PATH", "manual.pdf")),
            extracted_text_path: PathBuf::from(var_or(
                "EXTRACTED_TEXT_PATH",
                "manual_extracted.txt",
            )),
            embeddings_cache_path: PathBuf::from(var_or(
                "EMBEDDINGS_CACHE_PATH",
                "manual_embeddings.json",
            )),
            max_tokens: parsed_or("CHUNK_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            top_k: parsed_or("TOP_K", DEFAULT_TOP_K)?,
            request_timeout: Duration::from_secs(parsed_or("REQUEST_TIMEOUT_SECS", 60)? as u64),
            rebuild_stale_cache: flag("MANUALSMITH_REBUILD"),
            plain_chat: flag("MANUALSMITH_PLAIN_CHAT"),
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AssistantError::Config(format!("missing required environment variable {key}")))
}

fn required_url(key: &str) -> Result<Url> {
    let raw = required(key)?;
    Url::parse(&raw)
        .map_err(|err| AssistantError::Config(format!("{key} is not a valid URL: {err}")))
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| AssistantError::Config(format!("{key} is not a number: {err}"))),
        Err(_) => Ok(default),
    }
}

fn flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}
