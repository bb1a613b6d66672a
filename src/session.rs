//! Conversation session state and the two ask modes.
//!
//! A [`Session`] is owned by the caller; nothing in this crate holds global
//! conversation state, so several independent sessions can coexist. History
//! is append-only and lives only in memory for the life of the session.

use tracing::debug;

use crate::chat::ChatProvider;
use crate::embeddings::EmbeddingProvider;
use crate::message::Message;
use crate::retrieval;
use crate::store::EmbeddingRecord;
use crate::types::Result;

/// Inputs that end the interactive loop, matched case-insensitively.
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Sliding-window size for the plain-chat mode: only this many trailing
/// history messages are sent per turn.
pub const HISTORY_WINDOW: usize = 5;

/// Sampling temperature used by the retrieval-augmented mode.
pub const RAG_TEMPERATURE: f32 = 0.2;

/// Returns true when `input` should terminate the interactive loop.
pub fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

/// One conversation: a system instruction plus append-only message history.
#[derive(Debug, Clone)]
pub struct Session {
    system_prompt: String,
    history: Vec<Message>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
        }
    }

    /// Read-only view of the accumulated history.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Retrieval-augmented turn.
    ///
    /// Retrieves top-k context for the query, appends the combined
    /// query+context user message, sends the system prompt plus the full
    /// history at temperature 0.2, and appends the reply. If the chat call
    /// fails the turn ends with the user message still in history and no
    /// assistant message appended.
    pub async fn ask(
        &mut self,
        query: &str,
        embeddings: &dyn EmbeddingProvider,
        chat: &dyn ChatProvider,
        records: &[EmbeddingRecord],
        top_k: usize,
    ) -> Result<String> {
        let context = retrieval::retrieve_context(embeddings, records, query, top_k).await?;
        self.history
            .push(Message::user(&format!("{query}\n\nContext:\n{context}")));

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend_from_slice(&self.history);
        debug!(turn_messages = messages.len(), "sending retrieval-augmented turn");

        let reply = chat.complete(&messages, Some(RAG_TEMPERATURE)).await?;
        self.history.push(Message::assistant(&reply));
        Ok(reply)
    }

    /// Plain windowed turn: no retrieval, no temperature override, and only
    /// the last [`HISTORY_WINDOW`] history messages are sent after the
    /// system prompt.
    pub async fn chat(&mut self, query: &str, chat: &dyn ChatProvider) -> Result<String> {
        self.history.push(Message::user(query));

        let window_start = self.history.len().saturating_sub(HISTORY_WINDOW);
        let mut messages = Vec::with_capacity(HISTORY_WINDOW + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend_from_slice(&self.history[window_start..]);
        debug!(turn_messages = messages.len(), "sending plain-chat turn");

        let reply = chat.complete(&messages, None).await?;
        self.history.push(Message::assistant(&reply));
        Ok(reply)
    }
}
