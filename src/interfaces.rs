//! Contracts consumed by the engine: tokenization, generation, segmentation,
//! similarity, scoring and dataset access. Concrete implementations live in
//! their own modules and are injected into the orchestrator.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::types::GenerationSettings;

/// Token-level view of text, with a bounded context window.
pub trait Tokenizer: Send + Sync {
    /// Encode text into an ordered token id sequence.
    fn encode(&self, text: &str) -> Vec<u32>;
    /// Decode token ids back into text.
    fn decode(&self, ids: &[u32]) -> String;
    /// Maximum number of input tokens a single generation call accepts.
    fn max_input_length(&self) -> usize;
}

/// Bounded-context sequence generation backend.
///
/// Inference is logically read-only; implementations shared across concurrent
/// callers must either be safe for parallel calls or serialize internally.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a continuation for the given input ids. Deterministic for
    /// identical inputs and a fixed beam count.
    async fn generate(&self, input_ids: &[u32], settings: &GenerationSettings) -> Result<Vec<u32>>;

    /// Cheap availability probe, checked before any chunking work begins.
    async fn is_available(&self) -> bool;
}

/// Splits text into ordered sentences.
pub trait SentenceSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Pairwise sentence similarity oracle.
pub trait SimilaritySource: Send + Sync {
    /// Symmetric, non-negative N×N similarity matrix for the given sentences.
    fn pairwise_similarity(&self, sentences: &[String]) -> Result<Vec<Vec<f64>>>;
}

/// Overlap-based quality scores for one (reference, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapScores {
    /// Unigram overlap F1.
    pub unigram_f1: f64,
    /// Bigram overlap F1.
    pub bigram_f1: f64,
    /// Longest-common-subsequence F1.
    pub lcs_f1: f64,
}

/// Scores a generated summary against a reference summary.
pub trait OverlapScorer: Send + Sync {
    fn score(&self, reference: &str, candidate: &str) -> OverlapScores;
}

/// One labeled evaluation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Full source document.
    pub source_text: String,
    /// Human reference summary.
    pub reference_text: String,
}

/// Ordered access to a labeled dataset.
pub trait DatasetSource: Send + Sync {
    fn rows(&self, path: &Path) -> Result<Vec<DatasetRow>>;
}

/// Tokenizer/generator pair the generative stages operate on.
#[derive(Clone)]
pub struct ModelParts {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for ModelParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelParts").finish_non_exhaustive()
    }
}

type ModelFactory = Box<dyn Fn() -> Result<ModelParts> + Send + Sync>;

/// Lazily initialized, load-once handle to the generation backend.
///
/// Replaces a process-global singleton: the handle is owned by whoever builds
/// the orchestrator, loads the backend on first use and hands out cheap clones
/// of the shared parts afterwards. A factory failure is reported on every
/// acquire until a later call succeeds.
pub struct ModelHandle {
    parts: Mutex<Option<ModelParts>>,
    factory: ModelFactory,
}

impl ModelHandle {
    /// Handle that builds the backend on first acquire.
    pub fn new(factory: impl Fn() -> Result<ModelParts> + Send + Sync + 'static) -> Self {
        Self {
            parts: Mutex::new(None),
            factory: Box::new(factory),
        }
    }

    /// Handle around an already-constructed backend.
    pub fn preloaded(parts: ModelParts) -> Self {
        Self {
            parts: Mutex::new(Some(parts)),
            factory: Box::new(|| unreachable!("preloaded handle never invokes its factory")),
        }
    }

    /// Shared tokenizer/generator pair, loading it on first use.
    pub async fn acquire(&self) -> Result<ModelParts> {
        let mut guard = self.parts.lock().await;
        if let Some(parts) = guard.as_ref() {
            return Ok(parts.clone());
        }
        let parts = (self.factory)()?;
        *guard = Some(parts.clone());
        Ok(parts)
    }
}
