//! Word vectors learned from the tool corpus itself.
//!
//! Training counts distance-weighted co-occurrences inside a sliding window,
//! keeps each word's strongest neighbours as features, and scores each
//! feature with positive pointwise mutual information. Text embeddings are
//! the normalized mean of their known word vectors.

use super::lexical::tokenize;
use super::vector::{l2_normalize, Embedding};
use super::EmbeddingStrategy;
use crate::error::RankingError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub struct WordVectorStrategy {
    window: usize,
    dimension: usize,
    vocabulary: HashMap<String, usize>,
    vectors: Vec<Embedding>,
}

impl WordVectorStrategy {
    pub fn new(window: usize, dimension: usize) -> Self {
        Self {
            window,
            dimension,
            vocabulary: HashMap::new(),
            vectors: Vec::new(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learned vector for a single word.
    pub fn word_vector(&self, word: &str) -> Option<&Embedding> {
        self.vocabulary.get(word).map(|&index| &self.vectors[index])
    }
}

impl EmbeddingStrategy for WordVectorStrategy {
    fn name(&self) -> &'static str {
        "word_vectors"
    }

    fn train(&mut self, documents: &[String]) {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        let words: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        self.vocabulary = words
            .into_iter()
            .enumerate()
            .map(|(index, word)| (word.to_string(), index))
            .collect();

        let vocab_size = self.vocabulary.len();

        // Sparse rows keyed by neighbour index. BTreeMap keeps summation order
        // fixed so repeated training produces identical vectors.
        let mut cooccurrence: Vec<BTreeMap<usize, f32>> = vec![BTreeMap::new(); vocab_size];
        for tokens in &tokenized {
            for (i, word) in tokens.iter().enumerate() {
                let row = self.vocabulary[word.as_str()];
                let start = i.saturating_sub(self.window);
                let end = (i + self.window + 1).min(tokens.len());

                for (j, neighbour) in tokens.iter().enumerate().take(end).skip(start) {
                    if i == j {
                        continue;
                    }
                    let column = self.vocabulary[neighbour.as_str()];
                    *cooccurrence[row].entry(column).or_insert(0.0) += 1.0 / i.abs_diff(j) as f32;
                }
            }
        }

        let row_sums: Vec<f32> = cooccurrence.iter().map(|row| row.values().sum()).collect();
        let total: f32 = row_sums.iter().sum();

        self.vectors = (0..vocab_size)
            .map(|i| {
                let mut vector = Embedding::zeros(self.dimension);
                if total <= 0.0 {
                    return vector;
                }

                let mut neighbours: Vec<(usize, f32)> = cooccurrence[i]
                    .iter()
                    .filter(|&(&j, &mass)| j != i && mass > 0.0)
                    .map(|(&j, &mass)| (j, mass))
                    .collect();
                neighbours.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(Ordering::Equal)
                        .then(a.0.cmp(&b.0))
                });

                let p_i = row_sums[i] / total;
                for (feature, (j, mass)) in neighbours.into_iter().take(self.dimension).enumerate() {
                    let p_ij = mass / total;
                    let p_j = row_sums[j] / total;
                    if p_ij > 0.0 && p_i > 0.0 && p_j > 0.0 {
                        let pmi = (p_ij / (p_i * p_j)).ln();
                        if pmi > 0.0 {
                            vector[feature] = pmi;
                        }
                    }
                }

                l2_normalize(vector)
            })
            .collect();

        tracing::info!(
            documents = documents.len(),
            vocabulary_size = vocab_size,
            dimension = self.dimension,
            window = self.window,
            "Word vectors trained"
        );
    }

    fn generate(&self, text: &str) -> Result<Embedding, RankingError> {
        let mut sum = Embedding::zeros(self.dimension);
        let mut known = 0usize;

        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                sum += &self.vectors[index];
                known += 1;
            }
        }

        if known == 0 {
            return Ok(sum);
        }

        sum.mapv_inplace(|x| x / known as f32);
        Ok(l2_normalize(sum))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
