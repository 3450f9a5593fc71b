//! Shared fixtures: a canned generation backend over the word-level
//! tokenizer, and builders for a fully wired engine.

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use sumai::budget::LengthBudgetPlanner;
use sumai::chunker::{ChunkedGenerator, ChunkingConfig};
use sumai::error::Result;
use sumai::evaluation::EvaluationRunner;
use sumai::interfaces::{Generator, ModelHandle, ModelParts, Tokenizer};
use sumai::orchestrator::Summarizer;
use sumai::remote::HashVocabTokenizer;
use sumai::scoring::RougeScorer;
use sumai::segment::UnicodeSegmenter;
use sumai::similarity::TfIdfSimilarity;
use sumai::textrank::{RankerConfig, SimilarityGraphRanker};
use sumai::types::GenerationSettings;

/// Backend that always answers with the same canned summary.
pub struct CannedGenerator {
    reply: String,
    available: bool,
    tokenizer: Arc<dyn Tokenizer>,
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _input_ids: &[u32],
        _settings: &GenerationSettings,
    ) -> Result<Vec<u32>> {
        Ok(self.tokenizer.encode(&self.reply))
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

/// Model parts backed by a canned generator.
pub fn canned_model(reply: &str, available: bool) -> ModelParts {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(HashVocabTokenizer::default());
    ModelParts {
        generator: Arc::new(CannedGenerator {
            reply: reply.to_string(),
            available,
            tokenizer: tokenizer.clone(),
        }),
        tokenizer,
    }
}

/// Fully wired summarizer around the canned backend.
pub fn summarizer(reply: &str, available: bool) -> Arc<Summarizer> {
    Arc::new(Summarizer::new(
        Arc::new(UnicodeSegmenter),
        SimilarityGraphRanker::new(RankerConfig::default(), Arc::new(TfIdfSimilarity)),
        ChunkedGenerator::new(ChunkingConfig::default(), LengthBudgetPlanner::default()),
        Arc::new(ModelHandle::preloaded(canned_model(reply, available))),
    ))
}

/// Evaluation runner over the TSV dataset source and the default scorer.
pub fn runner(summarizer: Arc<Summarizer>) -> Arc<EvaluationRunner> {
    Arc::new(EvaluationRunner::new(
        summarizer,
        Arc::new(sumai::dataset::TsvDatasetSource::default()),
        Arc::new(RougeScorer),
    ))
}

/// TSV dataset fixture: `rows` pairs of (article, summary).
pub fn dataset_file(rows: &[(&str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "article\tsummary").unwrap();
    for (article, summary) in rows {
        writeln!(file, "{}\t{}", article, summary).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Ten usable rows with an empty reference at position 3.
pub fn ten_rows_one_bad() -> Vec<(&'static str, &'static str)> {
    let good = (
        "The committee approved the annual budget. The vote was unanimous. Members adjourned at noon.",
        "The committee unanimously approved the budget.",
    );
    (0..10)
        .map(|i| if i == 3 { (good.0, "") } else { good })
        .collect()
}
