//! Cosine-similarity ranking and top-k context assembly.
//!
//! Retrieval is a linear scan over the in-memory records: score every chunk
//! against the query vector, sort descending, keep the top k. No index
//! structure; the corpus is one small manual.

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::store::EmbeddingRecord;
use crate::types::Result;

/// Separator between retrieved chunks in the assembled context string.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Cosine similarity between two vectors, in [-1, 1].
///
/// A zero-magnitude vector on either side yields 0.0 rather than a division
/// by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Scores every record against the query vector and returns record indices
/// ordered by descending similarity. The sort is stable, so ties keep their
/// insertion order.
pub fn rank(records: &[EmbeddingRecord], query: &[f32]) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (idx, cosine_similarity(query, &record.embedding)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Joins the top-k chunk texts for a query vector into one context string.
pub fn top_k_context(records: &[EmbeddingRecord], query: &[f32], top_k: usize) -> String {
    let ranked = rank(records, query);
    let selected: Vec<&str> = ranked
        .iter()
        .take(top_k)
        .map(|(idx, _)| records[*idx].content.as_str())
        .collect();
    selected.join(CONTEXT_SEPARATOR)
}

/// Embeds the query and assembles the top-k context string.
pub async fn retrieve_context(
    provider: &dyn EmbeddingProvider,
    records: &[EmbeddingRecord],
    query: &str,
    top_k: usize,
) -> Result<String> {
    let query_embedding = provider.embed(query).await?;
    let context = top_k_context(records, &query_embedding, top_k);
    debug!(top_k, candidates = records.len(), "retrieved context");
    Ok(context)
}
