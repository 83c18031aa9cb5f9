//! Input and output encoding
//!
//! Input: one JSON array of strings, e.g. `["hello world", "second"]`, or raw
//! text split with [`chunk_text`].
//! Output: one JSON array of float arrays on a single line, same order and
//! count as the input.

use crate::models::{Embedding, EmbeddingError, EmbeddingResult};

/// Parse the command line argument into the texts to embed.
///
/// Anything other than an array of strings is rejected.
pub fn parse_texts(raw: &str) -> EmbeddingResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| EmbeddingError::InvalidInput {
        message: format!("expected a JSON array of strings: {}", e),
    })
}

/// Chunk size used by the document ingestion callers
pub const DEFAULT_CHUNK_CHARS: usize = 300;

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Sentences as runs of non-terminators followed by one or more of `.`, `!`,
/// `?`. Leading terminators and text after the last terminator are dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_terminators = false;

    for (i, c) in text.char_indices() {
        match (start, is_sentence_end(c)) {
            (None, true) => {}
            (None, false) => start = Some(i),
            (Some(_), true) => in_terminators = true,
            (Some(s), false) if in_terminators => {
                sentences.push(&text[s..i]);
                start = Some(i);
                in_terminators = false;
            }
            (Some(_), false) => {}
        }
    }

    if let (Some(s), true) = (start, in_terminators) {
        sentences.push(&text[s..]);
    }
    sentences
}

/// Split raw text into chunks of whole sentences, packing greedily.
///
/// A sentence that would push the current chunk past `max_chars` closes the
/// chunk, even when the chunk is still empty; a single sentence longer than
/// `max_chars` becomes its own chunk. Lengths count chars.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(sentence);
            current_len = sentence_len;
        } else {
            current.push_str(sentence);
            current_len += sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Render embeddings as a compact single-line JSON array.
pub fn render_embeddings(embeddings: &[Embedding]) -> EmbeddingResult<String> {
    Ok(serde_json::to_string(embeddings)?)
}
