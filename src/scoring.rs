//! Overlap-based summary quality metrics: unigram, bigram and
//! longest-common-subsequence F1 over unicode word tokens, no stemming.

use std::collections::HashMap;

use crate::interfaces::{OverlapScorer, OverlapScores};
use crate::segment::word_tokens;

/// Default [`OverlapScorer`]: ROUGE-1, ROUGE-2 and ROUGE-L F-measures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RougeScorer;

impl OverlapScorer for RougeScorer {
    fn score(&self, reference: &str, candidate: &str) -> OverlapScores {
        let reference = word_tokens(reference);
        let candidate = word_tokens(candidate);
        OverlapScores {
            unigram_f1: ngram_f1(&reference, &candidate, 1),
            bigram_f1: ngram_f1(&reference, &candidate, 2),
            lcs_f1: lcs_f1(&reference, &candidate),
        }
    }
}

fn ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts: HashMap<&[String], usize> = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn ngram_f1(reference: &[String], candidate: &[String], n: usize) -> f64 {
    let ref_grams = ngrams(reference, n);
    let cand_grams = ngrams(candidate, n);
    let ref_total: usize = ref_grams.values().sum();
    let cand_total: usize = cand_grams.values().sum();
    if ref_total == 0 || cand_total == 0 {
        return 0.0;
    }

    // Clipped overlap count.
    let overlap: usize = cand_grams
        .iter()
        .map(|(gram, &count)| count.min(*ref_grams.get(gram).unwrap_or(&0)))
        .sum();

    f1(overlap as f64 / cand_total as f64, overlap as f64 / ref_total as f64)
}

fn lcs_f1(reference: &[String], candidate: &[String]) -> f64 {
    if reference.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let lcs = lcs_length(reference, candidate) as f64;
    f1(lcs / candidate.len() as f64, lcs / reference.len() as f64)
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
    // Classic DP with a rolling row.
    let mut prev = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for token_a in a {
        for (j, token_b) in b.iter().enumerate() {
            current[j + 1] = if token_a == token_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}
