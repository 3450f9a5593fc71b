//! Map-reduce summarization over token windows.
//!
//! Long input is tokenized once and partitioned into overlapping windows
//! sized to the backend's context limit, each window is summarized
//! independently, and a final generation pass condenses the concatenated
//! chunk summaries. The reduce step runs even for a single chunk so that the
//! final output is always one normalizing generation away from the chunks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::{LengthBudgetPlanner, StageBudgets};
use crate::error::{Result, SumAiError};
use crate::interfaces::ModelParts;
use crate::types::GenerationSettings;

/// Window geometry and prompt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Nominal window size in tokens, before the prefix reserve is deducted.
    pub window_size: usize,
    /// Tokens shared between consecutive windows.
    pub overlap: usize,
    /// Floor on the effective window size after the prefix reserve.
    pub min_effective_window: usize,
    /// Hard cap on input tokens per generation call.
    pub max_input_length: usize,
    /// Instructional prefix prepended to every generation prompt.
    pub prefix: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 850,
            overlap: 120,
            min_effective_window: 50,
            max_input_length: 1024,
            prefix: "summarize: ".to_string(),
        }
    }
}

/// Half-open token span of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindow {
    pub start: usize,
    pub end: usize,
}

/// Partition `total_tokens` into windows of `effective_window` tokens,
/// stepping by `effective_window - overlap`. Every token lands in at least
/// one window; the last window may be shorter.
pub fn plan_windows(total_tokens: usize, effective_window: usize, overlap: usize) -> Vec<TokenWindow> {
    if total_tokens == 0 {
        return Vec::new();
    }
    let step = effective_window.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + effective_window).min(total_tokens);
        windows.push(TokenWindow { start, end });
        if end >= total_tokens {
            break;
        }
        start += step;
    }
    windows
}

/// Output of a map-reduce summarization.
#[derive(Debug, Clone)]
pub struct ChunkedSummary {
    /// Final reduced summary.
    pub summary: String,
    /// Per-chunk summaries in window order.
    pub chunk_summaries: Vec<String>,
    /// Bulleted concatenation fed into the reduce call.
    pub merged: String,
}

/// Summarizes unbounded text through a bounded-context generation backend.
pub struct ChunkedGenerator {
    config: ChunkingConfig,
    planner: LengthBudgetPlanner,
}

impl ChunkedGenerator {
    pub fn new(config: ChunkingConfig, planner: LengthBudgetPlanner) -> Self {
        Self { config, planner }
    }

    /// Map-reduce summarize `text`. With `ratio` set, stage budgets are
    /// derived from the source token count; otherwise the caller's fixed
    /// bounds in `settings` apply to both stages.
    pub async fn summarize(
        &self,
        model: &ModelParts,
        text: &str,
        ratio: Option<f64>,
        settings: &GenerationSettings,
    ) -> Result<ChunkedSummary> {
        if !model.generator.is_available().await {
            return Err(SumAiError::ModelUnavailable(
                "generation backend did not answer the availability probe".into(),
            ));
        }

        let ids = model.tokenizer.encode(text);
        let prefix_reserve = if self.config.prefix.is_empty() {
            0
        } else {
            model.tokenizer.encode(&self.config.prefix).len()
        };
        let effective_window = self
            .config
            .window_size
            .saturating_sub(prefix_reserve)
            .max(self.config.min_effective_window);

        let windows = plan_windows(ids.len(), effective_window, self.config.overlap);
        let chunks: Vec<String> = windows
            .iter()
            .map(|w| model.tokenizer.decode(&ids[w.start..w.end]).trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if chunks.is_empty() {
            return Ok(ChunkedSummary {
                summary: String::new(),
                chunk_summaries: Vec::new(),
                merged: String::new(),
            });
        }

        let (chunk_settings, final_settings) = match ratio {
            Some(r) => {
                let StageBudgets { chunk, final_stage } =
                    self.planner.plan(ids.len(), r, chunks.len());
                (
                    settings.with_bounds(chunk.min_tokens, chunk.max_tokens),
                    settings.with_bounds(final_stage.min_tokens, final_stage.max_tokens),
                )
            }
            None => (settings.clone(), settings.clone()),
        };

        debug!(
            chunks = chunks.len(),
            tokens = ids.len(),
            chunk_max = chunk_settings.max_new_tokens,
            final_max = final_settings.max_new_tokens,
            "running map-reduce summarization"
        );

        let mut chunk_summaries = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let generated = self.generate_one(model, chunk, &chunk_settings).await?;
            if !generated.is_empty() {
                chunk_summaries.push(generated);
            }
        }

        let merged = chunk_summaries
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n");

        let summary = if merged.is_empty() {
            String::new()
        } else {
            self.generate_one(model, &merged, &final_settings).await?
        };

        Ok(ChunkedSummary {
            summary,
            chunk_summaries,
            merged,
        })
    }

    async fn generate_one(
        &self,
        model: &ModelParts,
        text: &str,
        settings: &GenerationSettings,
    ) -> Result<String> {
        let prompt = format!("{}{}", self.config.prefix, text.trim());
        let mut input = model.tokenizer.encode(&prompt);
        let limit = self.config.max_input_length.min(model.tokenizer.max_input_length());
        input.truncate(limit);
        let output = model.generator.generate(&input, settings).await?;
        Ok(model.tokenizer.decode(&output).trim().to_string())
    }
}
