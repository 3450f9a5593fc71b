//! Extractive summarization: sentences as graph nodes, similarity as edge
//! weights, PageRank-style centrality for ranking.
//!
//! Degradation is a policy, not an accident: a failing similarity oracle
//! becomes a zero matrix, and a graph with no edges or a non-converging
//! iteration becomes a uniform score over all sentences. The call itself
//! never fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::interfaces::SimilaritySource;

/// Tunables for graph construction and the centrality iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Pairs with similarity at or below this threshold get no edge.
    pub similarity_threshold: f64,
    /// PageRank damping factor.
    pub damping: f64,
    /// Iteration cap before declaring non-convergence.
    pub max_iterations: usize,
    /// L1 convergence tolerance.
    pub tolerance: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.1,
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Output of one extractive ranking pass.
#[derive(Debug, Clone)]
pub struct ExtractiveSummary {
    /// Selected sentences joined in original document order.
    pub summary: String,
    /// Selected sentence indices, strictly ascending.
    pub selected_indices: Vec<usize>,
    /// Centrality score for every sentence index.
    pub scores: BTreeMap<usize, f64>,
    /// Sentence count of the analyzed document.
    pub num_original_sentences: usize,
    /// Sentence count of the summary.
    pub num_summary_sentences: usize,
}

impl ExtractiveSummary {
    fn empty() -> Self {
        Self {
            summary: String::new(),
            selected_indices: Vec::new(),
            scores: BTreeMap::new(),
            num_original_sentences: 0,
            num_summary_sentences: 0,
        }
    }
}

/// Ranks sentences by centrality in a similarity graph and selects the top
/// scorers, re-ordered by original position.
pub struct SimilarityGraphRanker {
    config: RankerConfig,
    similarity: Arc<dyn SimilaritySource>,
}

impl SimilarityGraphRanker {
    pub fn new(config: RankerConfig, similarity: Arc<dyn SimilaritySource>) -> Self {
        Self { config, similarity }
    }

    /// Summarize an ordered sentence sequence. `count` overrides the
    /// ratio-derived selection size when given.
    pub fn summarize(&self, sentences: &[String], ratio: f64, count: Option<usize>) -> ExtractiveSummary {
        let n = sentences.len();
        if n == 0 {
            return ExtractiveSummary::empty();
        }
        if n == 1 {
            let mut scores = BTreeMap::new();
            scores.insert(0, 1.0);
            return ExtractiveSummary {
                summary: sentences[0].clone(),
                selected_indices: vec![0],
                scores,
                num_original_sentences: 1,
                num_summary_sentences: 1,
            };
        }

        let select = match count {
            Some(c) => c.min(n),
            None => ((n as f64 * ratio).round() as usize).max(1),
        };

        let matrix = match self.similarity.pairwise_similarity(sentences) {
            Ok(m) => m,
            Err(err) => {
                warn!(error = %err, "similarity computation failed, degrading to no-edges graph");
                vec![vec![0.0; n]; n]
            }
        };

        let scores = self.rank(&matrix, n);

        // Score descending, index ascending on ties, then back to document order.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut selected: Vec<usize> = order.into_iter().take(select).collect();
        selected.sort_unstable();

        let summary = selected
            .iter()
            .map(|&i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        ExtractiveSummary {
            summary,
            num_summary_sentences: selected.len(),
            selected_indices: selected,
            scores: scores.into_iter().enumerate().collect(),
            num_original_sentences: n,
        }
    }

    /// Weighted PageRank over the thresholded similarity graph. Falls back to
    /// a uniform 1/N score when the graph has no edges or the iteration does
    /// not converge within the cap.
    fn rank(&self, matrix: &[Vec<f64>], n: usize) -> Vec<f64> {
        let threshold = self.config.similarity_threshold;
        let mut weights = vec![vec![0.0; n]; n];
        let mut total_weight = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i != j && matrix[i][j] > threshold {
                    weights[i][j] = matrix[i][j];
                    total_weight += matrix[i][j];
                }
            }
        }

        let uniform = vec![1.0 / n as f64; n];
        if total_weight == 0.0 {
            debug!(sentences = n, "similarity graph has no edges, using uniform scores");
            return uniform;
        }

        let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
        let damping = self.config.damping;
        let mut scores = uniform.clone();

        for iteration in 0..self.config.max_iterations {
            // Mass of dangling nodes is redistributed uniformly.
            let dangling: f64 = (0..n)
                .filter(|&j| out_weight[j] == 0.0)
                .map(|j| scores[j])
                .sum();

            let mut next = vec![(1.0 - damping) / n as f64 + damping * dangling / n as f64; n];
            for j in 0..n {
                if out_weight[j] == 0.0 {
                    continue;
                }
                let share = damping * scores[j] / out_weight[j];
                for i in 0..n {
                    if weights[j][i] > 0.0 {
                        next[i] += share * weights[j][i];
                    }
                }
            }

            let diff: f64 = next
                .iter()
                .zip(scores.iter())
                .map(|(a, b)| (a - b).abs())
                .sum();
            scores = next;
            if diff < self.config.tolerance {
                debug!(iterations = iteration + 1, "centrality iteration converged");
                return scores;
            }
        }

        debug!(
            max_iterations = self.config.max_iterations,
            "centrality iteration did not converge, using uniform scores"
        );
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SumAiError};
    use crate::similarity::TfIdfSimilarity;

    struct FixedSimilarity(Vec<Vec<f64>>);

    impl SimilaritySource for FixedSimilarity {
        fn pairwise_similarity(&self, _sentences: &[String]) -> Result<Vec<Vec<f64>>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSimilarity;

    impl SimilaritySource for FailingSimilarity {
        fn pairwise_similarity(&self, _sentences: &[String]) -> Result<Vec<Vec<f64>>> {
            Err(SumAiError::Http("vectorizer offline".into()))
        }
    }

    fn sents(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ranker(similarity: Arc<dyn SimilaritySource>) -> SimilarityGraphRanker {
        SimilarityGraphRanker::new(RankerConfig::default(), similarity)
    }

    #[test]
    fn empty_document_gives_empty_summary() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let out = r.summarize(&[], 0.3, None);
        assert!(out.summary.is_empty());
        assert!(out.selected_indices.is_empty());
        assert_eq!(out.num_original_sentences, 0);
    }

    #[test]
    fn single_sentence_is_its_own_summary_with_score_one() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let out = r.summarize(&sents(&["Only sentence."]), 0.3, None);
        assert_eq!(out.summary, "Only sentence.");
        assert_eq!(out.selected_indices, vec![0]);
        assert_eq!(out.scores.get(&0), Some(&1.0));
    }

    #[test]
    fn three_sentences_ratio_034_selects_exactly_one() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let input = sents(&[
            "The cat sat on the mat.",
            "The cat sat on the rug near the mat.",
            "Bond yields were unchanged.",
        ]);
        let out = r.summarize(&input, 0.34, None);
        assert_eq!(out.selected_indices.len(), 1);
        assert_eq!(out.summary, input[out.selected_indices[0]]);
    }

    #[test]
    fn selection_count_follows_rounded_ratio() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let input: Vec<String> = (0..10)
            .map(|i| format!("Sentence number {} talks about topic {}.", i, i % 3))
            .collect();
        for &(ratio, expected) in &[(0.05_f64, 1_usize), (0.3, 3), (0.55, 6), (0.9, 9)] {
            let out = r.summarize(&input, ratio, None);
            assert_eq!(out.selected_indices.len(), expected, "ratio {}", ratio);
        }
    }

    #[test]
    fn explicit_count_caps_at_sentence_total() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let input = sents(&["One.", "Two.", "Three."]);
        let out = r.summarize(&input, 0.3, Some(50));
        assert_eq!(out.selected_indices.len(), 3);
    }

    #[test]
    fn indices_are_ascending_and_in_range() {
        let r = ranker(Arc::new(TfIdfSimilarity));
        let input: Vec<String> = (0..8)
            .map(|i| format!("Shared topic sentence variant {}.", i))
            .collect();
        let out = r.summarize(&input, 0.5, None);
        assert!(out.selected_indices.windows(2).all(|w| w[0] < w[1]));
        assert!(out.selected_indices.iter().all(|&i| i < input.len()));
    }

    #[test]
    fn no_edges_falls_back_to_uniform_and_selects_earliest() {
        let zero = vec![vec![0.0; 4]; 4];
        let r = ranker(Arc::new(FixedSimilarity(zero)));
        let input = sents(&["A.", "B.", "C.", "D."]);
        let out = r.summarize(&input, 0.5, None);
        // Uniform scores: ties broken by index, so the first two sentences win.
        assert_eq!(out.selected_indices, vec![0, 1]);
        let expected = 1.0 / 4.0;
        assert!(out.scores.values().all(|&s| (s - expected).abs() < 1e-12));
    }

    #[test]
    fn similarity_failure_degrades_instead_of_erroring() {
        let r = ranker(Arc::new(FailingSimilarity));
        let input = sents(&["A.", "B.", "C."]);
        let out = r.summarize(&input, 0.34, None);
        assert_eq!(out.selected_indices, vec![0]);
        assert_eq!(out.summary, "A.");
    }

    #[test]
    fn central_sentence_outranks_outlier() {
        // Sentences 0 and 1 support each other; 2 is isolated.
        let matrix = vec![
            vec![1.0, 0.8, 0.0],
            vec![0.8, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let r = ranker(Arc::new(FixedSimilarity(matrix)));
        let input = sents(&["A.", "B.", "C."]);
        let out = r.summarize(&input, 0.34, None);
        assert!(out.selected_indices == vec![0] || out.selected_indices == vec![1]);
        assert!(out.scores[&0] > out.scores[&2]);
    }

    #[test]
    fn summary_preserves_document_order_not_rank_order() {
        // Sentence 2 most central, then 0; selection must still read 0 before 2.
        let matrix = vec![
            vec![1.0, 0.2, 0.9],
            vec![0.2, 1.0, 0.3],
            vec![0.9, 0.3, 1.0],
        ];
        let r = ranker(Arc::new(FixedSimilarity(matrix)));
        let input = sents(&["First.", "Second.", "Third."]);
        let out = r.summarize(&input, 0.67, None);
        assert_eq!(out.selected_indices.len(), 2);
        assert!(out.selected_indices.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            out.summary,
            out.selected_indices
                .iter()
                .map(|&i| input[i].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
}
