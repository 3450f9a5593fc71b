//! Length budgeting: maps a requested compression ratio to generation-length
//! bounds for the chunk and final stages.
//!
//! The clamp constants are empirically chosen defaults, kept tunable through
//! configuration rather than baked into the call sites.

use serde::{Deserialize, Serialize};

/// Clamp constants for budget derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Lower clamp on the ratio-derived total token target.
    pub total_min: u32,
    /// Upper clamp on the ratio-derived total token target.
    pub total_max: u32,
    /// Lower clamp on a chunk's max-tokens bound.
    pub chunk_max_min: u32,
    /// Upper clamp on a chunk's max-tokens bound.
    pub chunk_max_max: u32,
    /// Lower clamp on a chunk's min-tokens bound.
    pub chunk_min_min: u32,
    /// Lower clamp on the final stage's max-tokens bound.
    pub final_max_min: u32,
    /// Upper clamp on the final stage's max-tokens bound.
    pub final_max_max: u32,
    /// Lower clamp on the final stage's min-tokens bound.
    pub final_min_min: u32,
    /// Fraction of the max bound used as the min bound.
    pub min_fraction: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            total_min: 40,
            total_max: 600,
            chunk_max_min: 20,
            chunk_max_max: 240,
            chunk_min_min: 10,
            final_max_min: 50,
            final_max_max: 600,
            final_min_min: 20,
            min_fraction: 0.6,
        }
    }
}

/// Token bounds for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBudget {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

/// Budgets for both stages of a map-reduce summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBudgets {
    /// Bounds for each per-chunk generation call.
    pub chunk: LengthBudget,
    /// Bounds for the final reduce call.
    pub final_stage: LengthBudget,
}

/// Derives generation-length bounds from a compression ratio. Budgeting is
/// opt-in: callers without a ratio keep their fixed bounds untouched.
#[derive(Debug, Clone, Default)]
pub struct LengthBudgetPlanner {
    config: BudgetConfig,
}

impl LengthBudgetPlanner {
    pub fn new(config: BudgetConfig) -> Self {
        Self { config }
    }

    /// Plan both stage budgets for a document of `source_tokens` tokens split
    /// into `chunk_count` windows, targeting `ratio` of the original length.
    pub fn plan(&self, source_tokens: usize, ratio: f64, chunk_count: usize) -> StageBudgets {
        let c = &self.config;
        let target_total = clamp_round(source_tokens as f64 * ratio, c.total_min, c.total_max);

        let chunks = chunk_count.max(1) as f64;
        let chunk_max = clamp_round(target_total as f64 / chunks, c.chunk_max_min, c.chunk_max_max);
        let chunk_min = clamp_round(
            chunk_max as f64 * c.min_fraction,
            c.chunk_min_min,
            chunk_max,
        );

        let final_max = target_total.clamp(c.final_max_min, c.final_max_max);
        let final_min = clamp_round(
            final_max as f64 * c.min_fraction,
            c.final_min_min,
            final_max,
        );

        StageBudgets {
            chunk: LengthBudget {
                min_tokens: chunk_min,
                max_tokens: chunk_max,
            },
            final_stage: LengthBudget {
                min_tokens: final_min,
                max_tokens: final_max,
            },
        }
    }
}

fn clamp_round(value: f64, min: u32, max: u32) -> u32 {
    (value.round() as i64).clamp(min as i64, max as i64) as u32
}
