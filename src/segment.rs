//! Text normalization, sentence segmentation and word tokenization.
//!
//! Handles both Latin and Arabic-script text: zero-width non-joiners and
//! non-breaking spaces are normalized, and Arabic punctuation marks count as
//! sentence terminators alongside the Latin ones.

use crate::interfaces::SentenceSegmenter;

const NBSP: char = '\u{00a0}';

/// Normalize whitespace without touching punctuation: NBSP becomes a plain
/// space, runs of whitespace collapse to one, the result is trimmed.
pub fn normalize_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c == NBSP { ' ' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '؟' | '۔' | '؛')
}

/// Split normalized text into sentences. A sentence ends at a terminator
/// followed by whitespace (or end of input); the terminator stays attached.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = normalize_text(text);
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if is_sentence_terminator(c) {
            // Consume a run of trailing terminators ("?!", "...").
            while let Some(&next) = chars.peek() {
                if is_sentence_terminator(next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().map_or(true, |&next| next.is_whitespace()) {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                current.clear();
            }
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Lowercased unicode word tokens. ZWNJ is treated as a separator so that
/// half-space-joined compounds split into their parts.
pub fn word_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Default segmenter used by the orchestrator and the evaluation runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        split_sentences(text)
    }
}
