//! Batch evaluation: drives the orchestrator over a labeled dataset and
//! averages overlap and length metrics over the rows that produced a
//! scoreable summary.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::clean_dataset_text;
use crate::error::{Result, SumAiError};
use crate::interfaces::{DatasetSource, OverlapScorer};
use crate::orchestrator::Summarizer;
use crate::types::{GenerationSettings, Strategy};

/// Parameters of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Dataset file to read rows from.
    pub dataset_path: PathBuf,
    /// Strategy applied to every row.
    pub strategy: Strategy,
    /// Requested summary length as a percentage of the original (1-100).
    pub length_percent: u32,
    /// Extractive-stage length percent; falls back to `length_percent`.
    pub extractive_length_percent: Option<u32>,
    /// Abstractive-stage length percent; falls back to `length_percent`.
    pub abstractive_length_percent: Option<u32>,
    /// Decoding parameters for generative stages.
    pub settings: GenerationSettings,
    /// Cap on evaluated rows after the offset; `None` evaluates to the end.
    pub max_samples: Option<usize>,
    /// Number of rows skipped from the start of the (possibly shuffled) list.
    pub start_index: usize,
    /// Shuffle rows before applying offset and cap.
    pub shuffle: bool,
    /// Seed for the shuffle; identical seeds yield identical orderings.
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset/test.csv"),
            strategy: Strategy::Extractive,
            length_percent: 30,
            extractive_length_percent: None,
            abstractive_length_percent: None,
            settings: GenerationSettings::default(),
            max_samples: Some(30),
            start_index: 0,
            shuffle: false,
            seed: 42,
        }
    }
}

/// Averaged metrics over the accepted rows of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Average unigram overlap F1.
    pub unigram_f1: f64,
    /// Average bigram overlap F1.
    pub bigram_f1: f64,
    /// Average longest-common-subsequence F1.
    pub lcs_f1: f64,
    /// Average generated summary length in characters.
    pub avg_gen_len: f64,
    /// Average reference summary length in characters.
    pub avg_ref_len: f64,
    /// Average generated chars divided by average source chars.
    pub compression_ratio: f64,
    /// Rows that were generated and scored.
    pub accepted: usize,
    /// Rows dropped for empty source, reference or generated text.
    pub skipped: usize,
}

/// Progress snapshot emitted after every processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Rows processed so far, scored or skipped.
    pub processed: usize,
    /// Total rows selected for this run.
    pub total: usize,
    /// Rows scored so far.
    pub accepted: usize,
    /// Rows skipped so far.
    pub skipped: usize,
}

#[derive(Default)]
struct Totals {
    unigram_f1: f64,
    bigram_f1: f64,
    lcs_f1: f64,
    source_chars: usize,
    reference_chars: usize,
    generated_chars: usize,
}

/// Runs one strategy/configuration over a labeled dataset.
pub struct EvaluationRunner {
    summarizer: Arc<Summarizer>,
    dataset: Arc<dyn DatasetSource>,
    scorer: Arc<dyn OverlapScorer>,
}

impl EvaluationRunner {
    pub fn new(
        summarizer: Arc<Summarizer>,
        dataset: Arc<dyn DatasetSource>,
        scorer: Arc<dyn OverlapScorer>,
    ) -> Self {
        Self {
            summarizer,
            dataset,
            scorer,
        }
    }

    /// Evaluate per `config`, invoking `progress` after every row in row
    /// order. Fails with `NoValidSamples` when nothing could be scored.
    pub async fn run<F>(&self, config: &EvaluationConfig, mut progress: F) -> Result<EvaluationReport>
    where
        F: FnMut(ProgressUpdate) + Send,
    {
        let mut rows = self.dataset.rows(&config.dataset_path)?;
        if config.shuffle {
            let mut rng = StdRng::seed_from_u64(config.seed);
            rows.shuffle(&mut rng);
        }

        let start = config.start_index.min(rows.len());
        let end = match config.max_samples {
            Some(limit) => (start + limit).min(rows.len()),
            None => rows.len(),
        };
        let selected = &rows[start..end];
        let total = selected.len();

        let extractive_ratio =
            percent_to_ratio(config.extractive_length_percent.unwrap_or(config.length_percent));
        let abstractive_ratio =
            percent_to_ratio(config.abstractive_length_percent.unwrap_or(config.length_percent));

        info!(
            strategy = %config.strategy,
            total,
            shuffle = config.shuffle,
            "starting evaluation run"
        );

        let mut totals = Totals::default();
        let mut accepted = 0usize;
        let mut skipped = 0usize;

        for (index, row) in selected.iter().enumerate() {
            let source = clean_dataset_text(&row.source_text);
            let reference = clean_dataset_text(&row.reference_text);

            if source.is_empty() || reference.is_empty() {
                skipped += 1;
                progress(ProgressUpdate {
                    processed: index + 1,
                    total,
                    accepted,
                    skipped,
                });
                continue;
            }

            let result = self
                .summarizer
                .summarize(
                    &source,
                    config.strategy,
                    extractive_ratio,
                    abstractive_ratio,
                    &config.settings,
                )
                .await?;
            let generated = clean_dataset_text(&result.summary);

            if generated.is_empty() {
                debug!(row = start + index, "generated summary was empty, skipping row");
                skipped += 1;
                progress(ProgressUpdate {
                    processed: index + 1,
                    total,
                    accepted,
                    skipped,
                });
                continue;
            }

            let scores = self.scorer.score(&reference, &generated);
            totals.unigram_f1 += scores.unigram_f1;
            totals.bigram_f1 += scores.bigram_f1;
            totals.lcs_f1 += scores.lcs_f1;
            totals.source_chars += source.chars().count();
            totals.reference_chars += reference.chars().count();
            totals.generated_chars += generated.chars().count();
            accepted += 1;

            progress(ProgressUpdate {
                processed: index + 1,
                total,
                accepted,
                skipped,
            });
        }

        if accepted == 0 {
            return Err(SumAiError::NoValidSamples);
        }

        let samples = accepted as f64;
        let avg_source_chars = totals.source_chars as f64 / samples;
        let avg_gen_len = totals.generated_chars as f64 / samples;
        let compression_ratio = if avg_source_chars > 0.0 {
            avg_gen_len / avg_source_chars
        } else {
            0.0
        };

        Ok(EvaluationReport {
            unigram_f1: totals.unigram_f1 / samples,
            bigram_f1: totals.bigram_f1 / samples,
            lcs_f1: totals.lcs_f1 / samples,
            avg_gen_len,
            avg_ref_len: totals.reference_chars as f64 / samples,
            compression_ratio,
            accepted,
            skipped,
        })
    }
}

fn percent_to_ratio(percent: u32) -> f64 {
    percent as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::LengthBudgetPlanner;
    use crate::chunker::{ChunkedGenerator, ChunkingConfig};
    use crate::interfaces::{DatasetRow, ModelHandle, ModelParts};
    use crate::scoring::RougeScorer;
    use crate::segment::UnicodeSegmenter;
    use crate::similarity::TfIdfSimilarity;
    use crate::textrank::{RankerConfig, SimilarityGraphRanker};
    use std::path::Path;

    struct InMemoryDataset(Vec<DatasetRow>);

    impl DatasetSource for InMemoryDataset {
        fn rows(&self, _path: &Path) -> Result<Vec<DatasetRow>> {
            Ok(self.0.clone())
        }
    }

    fn row(source: &str, reference: &str) -> DatasetRow {
        DatasetRow {
            source_text: source.to_string(),
            reference_text: reference.to_string(),
        }
    }

    fn extractive_runner(rows: Vec<DatasetRow>) -> EvaluationRunner {
        let summarizer = Summarizer::new(
            Arc::new(UnicodeSegmenter),
            SimilarityGraphRanker::new(RankerConfig::default(), Arc::new(TfIdfSimilarity)),
            ChunkedGenerator::new(ChunkingConfig::default(), LengthBudgetPlanner::default()),
            Arc::new(ModelHandle::new(|| {
                Err(SumAiError::ModelUnavailable("test has no backend".into()))
            })),
        );
        EvaluationRunner::new(
            Arc::new(summarizer),
            Arc::new(InMemoryDataset(rows)),
            Arc::new(RougeScorer),
        )
    }

    fn ten_rows_one_bad() -> Vec<DatasetRow> {
        (0..10)
            .map(|i| {
                if i == 3 {
                    row("A source document. With two sentences.", "")
                } else {
                    row(
                        "The committee approved the budget. The vote was unanimous. Members left at noon.",
                        "The committee approved the budget unanimously.",
                    )
                }
            })
            .collect()
    }

    fn config() -> EvaluationConfig {
        EvaluationConfig {
            max_samples: None,
            ..EvaluationConfig::default()
        }
    }

    #[tokio::test]
    async fn empty_reference_rows_are_skipped_not_failed() {
        let runner = extractive_runner(ten_rows_one_bad());
        let report = runner.run(&config(), |_| {}).await.unwrap();
        assert_eq!(report.accepted, 9);
        assert_eq!(report.skipped, 1);
        assert!(report.unigram_f1 > 0.0);
        assert!(report.avg_gen_len > 0.0);
    }

    #[tokio::test]
    async fn accepted_plus_skipped_equals_total_in_every_update() {
        let runner = extractive_runner(ten_rows_one_bad());
        let mut updates = Vec::new();
        runner
            .run(&config(), |u| updates.push(u))
            .await
            .unwrap();
        assert_eq!(updates.len(), 10);
        for (i, u) in updates.iter().enumerate() {
            assert_eq!(u.processed, i + 1);
            assert_eq!(u.total, 10);
            assert_eq!(u.accepted + u.skipped, u.processed);
        }
    }

    #[tokio::test]
    async fn zero_scoreable_rows_is_no_valid_samples() {
        let runner = extractive_runner(vec![row("", ""), row("   ", "ref")]);
        let err = runner.run(&config(), |_| {}).await.unwrap_err();
        assert_eq!(err.category(), "no_valid_samples");
    }

    #[tokio::test]
    async fn shuffle_is_deterministic_for_a_fixed_seed() {
        let rows: Vec<DatasetRow> = (0..20)
            .map(|i| row(&format!("Document {} body. Second sentence here.", i), "ignored"))
            .collect();

        let order_for_seed = |seed: u64| {
            let mut shuffled = rows.clone();
            let mut rng = StdRng::seed_from_u64(seed);
            shuffled.shuffle(&mut rng);
            shuffled
                .iter()
                .map(|r| r.source_text.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(order_for_seed(7), order_for_seed(7));
        assert_ne!(order_for_seed(7), order_for_seed(8));
    }

    #[tokio::test]
    async fn offset_and_limit_select_a_window() {
        let rows: Vec<DatasetRow> = (0..10)
            .map(|i| row(&format!("Document number {}. It has two sentences.", i), "Document."))
            .collect();
        let runner = extractive_runner(rows);
        let cfg = EvaluationConfig {
            start_index: 4,
            max_samples: Some(3),
            ..EvaluationConfig::default()
        };
        let mut seen_total = 0;
        let report = runner.run(&cfg, |u| seen_total = u.total).await.unwrap();
        assert_eq!(seen_total, 3);
        assert_eq!(report.accepted + report.skipped, 3);
    }

    #[tokio::test]
    async fn offset_past_the_end_yields_no_valid_samples() {
        let runner = extractive_runner(vec![row("Doc one. Second.", "ref")]);
        let cfg = EvaluationConfig {
            start_index: 50,
            ..config()
        };
        let err = runner.run(&cfg, |_| {}).await.unwrap_err();
        assert_eq!(err.category(), "no_valid_samples");
    }

    #[tokio::test]
    async fn generative_failure_propagates_out_of_the_run() {
        let runner = extractive_runner(vec![row("Doc one. Second sentence.", "ref")]);
        let cfg = EvaluationConfig {
            strategy: Strategy::Abstractive,
            ..config()
        };
        let err = runner.run(&cfg, |_| {}).await.unwrap_err();
        assert_eq!(err.category(), "model_unavailable");
    }
}
