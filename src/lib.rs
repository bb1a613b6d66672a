//! Retrieval-augmented question answering over a single PDF owner's manual.
//!
//! ```text
//! PDF bytes ──► extraction::extract_or_load ──► extraction text cache (.txt)
//!                                   │
//!                                   ▼
//!                      chunking::chunk_text ──► ordered chunk list
//!                                   │
//!                                   ▼
//! EmbeddingProvider ──► store::build_or_load ──► embedding cache (.json)
//!                                   │
//!                                   ▼
//! Query ──► retrieval::retrieve_context ──► context string
//!                                   │
//!                                   ▼
//! ChatProvider ──► session::Session::ask ──► assistant reply
//! ```
//!
//! Everything upstream of the REPL is a plain two-state cache: a file that is
//! either absent (build it) or present (load it). The retrieval step is an
//! O(n) cosine scan over the in-memory records, which is all a single small
//! manual needs.

pub mod chat;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod extraction;
pub mod message;
pub mod retrieval;
pub mod session;
pub mod store;
pub mod types;

pub use chat::ChatProvider;
pub use chunking::chunk_text;
pub use embeddings::EmbeddingProvider;
pub use message::Message;
pub use retrieval::cosine_similarity;
pub use session::Session;
pub use store::EmbeddingRecord;
pub use types::{AssistantError, Result};
