//! Shared result and parameter types for the summarization engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SumAiError;

/// Summarization strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Select representative sentences from the source, in original order.
    Extractive,
    /// Generate novel summary text with the generation backend.
    Abstractive,
    /// Extractive compression first, then generative re-summarization.
    Hybrid,
}

impl Strategy {
    /// Whether this strategy needs the generation backend at all.
    pub fn needs_generator(&self) -> bool {
        matches!(self, Strategy::Abstractive | Strategy::Hybrid)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Extractive => "extractive",
            Strategy::Abstractive => "abstractive",
            Strategy::Hybrid => "hybrid",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Strategy {
    type Err = SumAiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extractive" => Ok(Strategy::Extractive),
            "abstractive" => Ok(Strategy::Abstractive),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(SumAiError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Decoding parameters forwarded to the generation backend.
///
/// `min_new_tokens` / `max_new_tokens` are defaults; when the caller supplies a
/// length ratio they are recomputed per stage by the budget planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Beam count for beam search.
    pub num_beams: u32,
    /// Minimum number of generated tokens.
    pub min_new_tokens: u32,
    /// Maximum number of generated tokens.
    pub max_new_tokens: u32,
    /// Length penalty applied during beam search.
    pub length_penalty: f32,
    /// Repetition penalty applied during decoding.
    pub repetition_penalty: f32,
    /// Size of n-grams that may not repeat in the output.
    pub no_repeat_ngram_size: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            num_beams: 2,
            min_new_tokens: 40,
            max_new_tokens: 120,
            length_penalty: 1.0,
            repetition_penalty: 1.1,
            no_repeat_ngram_size: 3,
        }
    }
}

impl GenerationSettings {
    /// Copy of these settings with the token bounds replaced.
    pub fn with_bounds(&self, min_new_tokens: u32, max_new_tokens: u32) -> Self {
        Self {
            min_new_tokens,
            max_new_tokens,
            ..self.clone()
        }
    }
}

/// Output bundle of a summarization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Final summary text.
    pub summary: String,
    /// Strategy that produced the summary.
    pub strategy: Strategy,
    /// Indices of the selected sentences, strictly ascending.
    /// Populated for extractive and hybrid runs.
    pub selected_indices: Vec<usize>,
    /// Centrality score per sentence index. Populated for extractive and
    /// hybrid runs.
    pub scores: BTreeMap<usize, f64>,
    /// Per-chunk intermediate summaries, in chunk order. Populated for
    /// abstractive and hybrid runs.
    pub chunk_summaries: Vec<String>,
    /// Merged intermediate text fed into the final reduce call, when a
    /// generative stage ran.
    pub merged_intermediate: Option<String>,
    /// Number of sentences in the analyzed source document.
    pub num_original_sentences: usize,
    /// Number of sentences in the summary.
    pub num_summary_sentences: usize,
    /// Realized compression ratio: summary chars / source chars.
    pub compression_ratio: f64,
}

impl SummaryResult {
    /// Empty result for blank input.
    pub fn empty(strategy: Strategy) -> Self {
        Self {
            summary: String::new(),
            strategy,
            selected_indices: Vec::new(),
            scores: BTreeMap::new(),
            chunk_summaries: Vec::new(),
            merged_intermediate: None,
            num_original_sentences: 0,
            num_summary_sentences: 0,
            compression_ratio: 0.0,
        }
    }
}
