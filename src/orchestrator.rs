//! Strategy orchestration: composes the ranker and the chunked generator into
//! the extractive, abstractive and hybrid summarization paths.

use std::sync::Arc;

use tracing::info;

use crate::chunker::ChunkedGenerator;
use crate::error::Result;
use crate::interfaces::{ModelHandle, SentenceSegmenter};
use crate::segment::normalize_text;
use crate::textrank::SimilarityGraphRanker;
use crate::types::{GenerationSettings, Strategy, SummaryResult};

/// Caller-facing ratio clamps. Out-of-range input is clamped, never rejected.
const EXTRACTIVE_RATIO_RANGE: (f64, f64) = (0.05, 0.9);
const ABSTRACTIVE_RATIO_RANGE: (f64, f64) = (0.1, 0.9);

/// Composes the summarization components behind one `summarize` call.
pub struct Summarizer {
    segmenter: Arc<dyn SentenceSegmenter>,
    ranker: SimilarityGraphRanker,
    chunker: ChunkedGenerator,
    model: Arc<ModelHandle>,
}

impl Summarizer {
    pub fn new(
        segmenter: Arc<dyn SentenceSegmenter>,
        ranker: SimilarityGraphRanker,
        chunker: ChunkedGenerator,
        model: Arc<ModelHandle>,
    ) -> Self {
        Self {
            segmenter,
            ranker,
            chunker,
            model,
        }
    }

    /// Summarize `text` with the given strategy. The extractive and
    /// abstractive ratios are independent; each is clamped to its safe range
    /// before use.
    pub async fn summarize(
        &self,
        text: &str,
        strategy: Strategy,
        extractive_ratio: f64,
        abstractive_ratio: f64,
        settings: &GenerationSettings,
    ) -> Result<SummaryResult> {
        let text = normalize_text(text);
        if text.is_empty() {
            return Ok(SummaryResult::empty(strategy));
        }

        let extractive_ratio =
            extractive_ratio.clamp(EXTRACTIVE_RATIO_RANGE.0, EXTRACTIVE_RATIO_RANGE.1);
        let abstractive_ratio =
            abstractive_ratio.clamp(ABSTRACTIVE_RATIO_RANGE.0, ABSTRACTIVE_RATIO_RANGE.1);

        let result = match strategy {
            Strategy::Extractive => self.extractive(&text, extractive_ratio),
            Strategy::Abstractive => self.abstractive(&text, abstractive_ratio, settings).await?,
            Strategy::Hybrid => {
                self.hybrid(&text, extractive_ratio, abstractive_ratio, settings)
                    .await?
            }
        };

        info!(
            strategy = %strategy,
            source_chars = text.chars().count(),
            summary_chars = result.summary.chars().count(),
            "summarization finished"
        );
        Ok(result)
    }

    fn extractive(&self, text: &str, ratio: f64) -> SummaryResult {
        let sentences = self.segmenter.segment(text);
        let ranked = self.ranker.summarize(&sentences, ratio, None);
        SummaryResult {
            compression_ratio: compression(text, &ranked.summary),
            summary: ranked.summary,
            strategy: Strategy::Extractive,
            selected_indices: ranked.selected_indices,
            scores: ranked.scores,
            chunk_summaries: Vec::new(),
            merged_intermediate: None,
            num_original_sentences: ranked.num_original_sentences,
            num_summary_sentences: ranked.num_summary_sentences,
        }
    }

    async fn abstractive(
        &self,
        text: &str,
        ratio: f64,
        settings: &GenerationSettings,
    ) -> Result<SummaryResult> {
        let model = self.model.acquire().await?;
        let chunked = self
            .chunker
            .summarize(&model, text, Some(ratio), settings)
            .await?;
        let num_original_sentences = self.segmenter.segment(text).len();
        let num_summary_sentences = self.segmenter.segment(&chunked.summary).len();
        Ok(SummaryResult {
            compression_ratio: compression(text, &chunked.summary),
            summary: chunked.summary,
            strategy: Strategy::Abstractive,
            selected_indices: Vec::new(),
            scores: Default::default(),
            chunk_summaries: chunked.chunk_summaries,
            merged_intermediate: Some(chunked.merged),
            num_original_sentences,
            num_summary_sentences,
        })
    }

    /// Extractive compression first, then generative re-summarization of the
    /// extracted subset. Bounds the text the generative stage must process.
    async fn hybrid(
        &self,
        text: &str,
        extractive_ratio: f64,
        abstractive_ratio: f64,
        settings: &GenerationSettings,
    ) -> Result<SummaryResult> {
        let sentences = self.segmenter.segment(text);
        let ranked = self.ranker.summarize(&sentences, extractive_ratio, None);
        if ranked.summary.is_empty() {
            return Ok(SummaryResult::empty(Strategy::Hybrid));
        }

        let model = self.model.acquire().await?;
        let chunked = self
            .chunker
            .summarize(&model, &ranked.summary, Some(abstractive_ratio), settings)
            .await?;
        let num_summary_sentences = self.segmenter.segment(&chunked.summary).len();
        Ok(SummaryResult {
            compression_ratio: compression(text, &chunked.summary),
            summary: chunked.summary,
            strategy: Strategy::Hybrid,
            selected_indices: ranked.selected_indices,
            scores: ranked.scores,
            chunk_summaries: chunked.chunk_summaries,
            merged_intermediate: Some(chunked.merged),
            num_original_sentences: ranked.num_original_sentences,
            num_summary_sentences,
        })
    }
}

fn compression(source: &str, summary: &str) -> f64 {
    let source_chars = source.chars().count();
    if source_chars == 0 {
        return 0.0;
    }
    summary.chars().count() as f64 / source_chars as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::LengthBudgetPlanner;
    use crate::chunker::ChunkingConfig;
    use crate::interfaces::{Generator, ModelParts, Tokenizer};
    use crate::segment::UnicodeSegmenter;
    use crate::similarity::TfIdfSimilarity;
    use crate::textrank::RankerConfig;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Byte-per-char tokenizer: ids are unicode scalar values.
    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.chars().map(|c| c as u32).collect()
        }
        fn decode(&self, ids: &[u32]) -> String {
            ids.iter().filter_map(|&id| char::from_u32(id)).collect()
        }
        fn max_input_length(&self) -> usize {
            4096
        }
    }

    /// Returns a canned summary and records every prompt it saw.
    struct ScriptedGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(
            &self,
            input_ids: &[u32],
            _settings: &GenerationSettings,
        ) -> crate::error::Result<Vec<u32>> {
            let prompt: String = input_ids.iter().filter_map(|&id| char::from_u32(id)).collect();
            self.prompts.lock().push(prompt);
            Ok(self.reply.chars().map(|c| c as u32).collect())
        }
        async fn is_available(&self) -> bool {
            true
        }
    }

    fn summarizer_with(generator: Arc<ScriptedGenerator>) -> Summarizer {
        let parts = ModelParts {
            tokenizer: Arc::new(CharTokenizer),
            generator,
        };
        Summarizer::new(
            Arc::new(UnicodeSegmenter),
            SimilarityGraphRanker::new(RankerConfig::default(), Arc::new(TfIdfSimilarity)),
            ChunkedGenerator::new(ChunkingConfig::default(), LengthBudgetPlanner::default()),
            Arc::new(ModelHandle::preloaded(parts)),
        )
    }

    const DOC: &str = "The reactor design was finalized in March. \
        The reactor design passed its safety review in April. \
        A celebration dinner was held downtown.";

    #[tokio::test]
    async fn extractive_returns_subset_in_document_order() {
        let s = summarizer_with(Arc::new(ScriptedGenerator::new("unused")));
        let out = s
            .summarize(DOC, Strategy::Extractive, 0.67, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out.strategy, Strategy::Extractive);
        assert_eq!(out.num_original_sentences, 3);
        assert_eq!(out.selected_indices.len(), 2);
        assert!(out.selected_indices.windows(2).all(|w| w[0] < w[1]));
        assert!(out.chunk_summaries.is_empty());
        assert!(out.compression_ratio > 0.0 && out.compression_ratio <= 1.0);
    }

    #[tokio::test]
    async fn abstractive_carries_intermediate_artifacts() {
        let s = summarizer_with(Arc::new(ScriptedGenerator::new("A generated summary.")));
        let out = s
            .summarize(DOC, Strategy::Abstractive, 0.3, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out.summary, "A generated summary.");
        assert_eq!(out.chunk_summaries.len(), 1);
        assert!(out.merged_intermediate.is_some());
        assert!(out.selected_indices.is_empty());
    }

    #[tokio::test]
    async fn hybrid_feeds_extracted_text_into_generator() {
        let generator = Arc::new(ScriptedGenerator::new("Condensed."));
        let s = summarizer_with(generator.clone());
        let out = s
            .summarize(DOC, Strategy::Hybrid, 0.34, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out.summary, "Condensed.");
        // Hybrid keeps both the selection and the generated artifacts.
        assert_eq!(out.selected_indices.len(), 1);
        assert!(!out.chunk_summaries.is_empty());

        // The first prompt must contain extracted document text, not the
        // whole document: one sentence out of three.
        let prompts = generator.prompts.lock();
        let first = &prompts[0];
        assert!(first.starts_with("summarize: "));
        assert!(first.len() < DOC.len() + "summarize: ".len());
    }

    #[tokio::test]
    async fn blank_input_short_circuits_to_empty_result() {
        let s = summarizer_with(Arc::new(ScriptedGenerator::new("unused")));
        let out = s
            .summarize("  \n ", Strategy::Abstractive, 0.3, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert!(out.summary.is_empty());
        assert_eq!(out.num_original_sentences, 0);
    }

    #[tokio::test]
    async fn out_of_range_ratios_are_clamped_not_rejected() {
        let s = summarizer_with(Arc::new(ScriptedGenerator::new("unused")));
        // Ratio 50.0 clamps to 0.9: selects round(3 * 0.9) = 3 sentences.
        let out = s
            .summarize(DOC, Strategy::Extractive, 50.0, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out.selected_indices.len(), 3);

        // Ratio 0.0 clamps to 0.05: still selects at least one sentence.
        let out = s
            .summarize(DOC, Strategy::Extractive, 0.0, 0.3, &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out.selected_indices.len(), 1);
    }
}
