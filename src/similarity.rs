//! TF-IDF sentence vectors and cosine similarity.
//!
//! Default [`SimilaritySource`] implementation. Anything that goes wrong here
//! degrades to a zero matrix; the ranker treats that as a graph with no edges.

use std::collections::HashMap;

use crate::error::Result;
use crate::interfaces::SimilaritySource;
use crate::segment::word_tokens;

/// Pairwise cosine similarity over TF-IDF sentence vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfSimilarity;

impl TfIdfSimilarity {
    fn matrix(&self, sentences: &[String]) -> Vec<Vec<f64>> {
        let n = sentences.len();
        if n < 2 {
            return vec![vec![0.0; n]; n];
        }

        let tokenized: Vec<Vec<String>> = sentences.iter().map(|s| word_tokens(s)).collect();

        // Vocabulary and per-term document frequency.
        let mut vocab: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_id = vocab.len();
                let id = *vocab.entry(token.as_str()).or_insert_with(|| {
                    doc_freq.push(0);
                    next_id
                });
                if !seen.contains(&id) {
                    doc_freq[id] += 1;
                    seen.push(id);
                }
            }
        }

        // Smoothed idf, sklearn-style: ln((1 + n) / (1 + df)) + 1.
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        // L2-normalized tf-idf vectors, kept sparse as (term id, weight).
        let vectors: Vec<Vec<(usize, f64)>> = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: HashMap<usize, f64> = HashMap::new();
                for token in tokens {
                    if let Some(&id) = vocab.get(token.as_str()) {
                        *counts.entry(id).or_insert(0.0) += 1.0;
                    }
                }
                let mut vector: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(id, tf)| (id, tf * idf[id]))
                    .collect();
                let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in vector.iter_mut() {
                        *w /= norm;
                    }
                }
                vector.sort_by_key(|&(id, _)| id);
                vector
            })
            .collect();

        let mut matrix = vec![vec![0.0; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = sparse_dot(&vectors[i], &vectors[j]);
                matrix[i][j] = sim;
                matrix[j][i] = sim;
            }
        }
        matrix
    }
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let mut dot = 0.0;
    let (mut ia, mut ib) = (0, 0);
    while ia < a.len() && ib < b.len() {
        match a[ia].0.cmp(&b[ib].0) {
            std::cmp::Ordering::Less => ia += 1,
            std::cmp::Ordering::Greater => ib += 1,
            std::cmp::Ordering::Equal => {
                dot += a[ia].1 * b[ib].1;
                ia += 1;
                ib += 1;
            }
        }
    }
    dot
}

impl SimilaritySource for TfIdfSimilarity {
    fn pairwise_similarity(&self, sentences: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(self.matrix(sentences))
    }
}
