//! Line-accumulator chunking of extracted manual text.
//!
//! Chunks are the retrieval unit: contiguous runs of whole lines whose total
//! character length stays under a budget. Character length stands in for
//! token count; the bound is approximate by design.

/// Default character budget per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 500;

/// Splits `text` into ordered chunks of whole lines bounded by `max_tokens`
/// characters.
///
/// Lines are accumulated until adding the next one would reach the budget,
/// at which point the accumulator is flushed (trimmed) and the line starts a
/// fresh chunk. A single line longer than the budget is never split; it
/// becomes its own oversized chunk, since the bound only gates line
/// boundaries.
///
/// Pure and deterministic: the same input always yields the same chunks, and
/// concatenating the chunks in order reproduces the input's line sequence
/// (modulo the trimming applied at flush time).
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if current.len() + line.len() < max_tokens {
            current.push_str(line);
            current.push('\n');
        } else {
            let flushed = current.trim();
            if !flushed.is_empty() {
                chunks.push(flushed.to_string());
            }
            current.clear();
            current.push_str(line);
            current.push('\n');
        }
    }

    let flushed = current.trim();
    if !flushed.is_empty() {
        chunks.push(flushed.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_lines_accumulate_into_one_chunk() {
        let chunks = chunk_text("a\nb\nc", 100);
        assert_eq!(chunks, vec!["a\nb\nc".to_string()]);
    }

    #[test]
    fn each_line_becomes_its_own_chunk_under_tight_budget() {
        // Each line alone fits; any two together reach the budget.
        let chunks = chunk_text("Line A\nLine B\nLine C", 10);
        assert_eq!(chunks, vec!["Line A", "Line B", "Line C"]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("\n\n\n", 500).is_empty());
    }

    #[test]
    fn oversized_line_is_never_split() {
        let long = "x".repeat(1000);
        let text = format!("short\n{long}\ntail");
        let chunks = chunk_text(&text, 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], long);
    }

    #[test]
    fn whitespace_only_final_accumulator_is_not_emitted() {
        let chunks = chunk_text("content\n   \n", 5);
        assert_eq!(chunks, vec!["content"]);
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        // Non-blank printable lines without embedded newlines, so line
        // reconstruction is exact under trimming.
        "[a-zA-Z0-9 ]{1,40}".prop_map(|s| s.trim().to_string()).prop_filter(
            "line must survive trimming",
            |s| !s.is_empty(),
        )
    }

    proptest! {
        #[test]
        fn chunks_reconstruct_the_line_sequence(
            lines in proptest::collection::vec(line_strategy(), 0..40),
            max_tokens in 1usize..200,
        ) {
            let text = lines.join("\n");
            let chunks = chunk_text(&text, max_tokens);
            let rebuilt: Vec<&str> = chunks
                .iter()
                .flat_map(|c| c.lines())
                .collect();
            let expected: Vec<&str> = lines.iter().map(String::as_str).collect();
            prop_assert_eq!(rebuilt, expected);
        }

        #[test]
        fn no_chunk_boundary_splits_a_line(
            lines in proptest::collection::vec(line_strategy(), 1..40),
            max_tokens in 1usize..200,
        ) {
            let text = lines.join("\n");
            for chunk in chunk_text(&text, max_tokens) {
                for chunk_line in chunk.lines() {
                    prop_assert!(
                        lines.iter().any(|l| l == chunk_line),
                        "chunk line {:?} is not a whole input line",
                        chunk_line
                    );
                }
            }
        }

        #[test]
        fn chunking_is_deterministic(
            lines in proptest::collection::vec(line_strategy(), 0..30),
            max_tokens in 1usize..200,
        ) {
            let text = lines.join("\n");
            prop_assert_eq!(chunk_text(&text, max_tokens), chunk_text(&text, max_tokens));
        }
    }
}
