//! TF-IDF embeddings over the tool corpus. Always available, so it is the
//! fallback whenever a preferred strategy cannot be loaded.

use super::lexical::tokenize;
use super::vector::{l2_normalize, Embedding};
use super::EmbeddingStrategy;
use crate::error::RankingError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct TfIdfStrategy {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    trained: bool,
}

impl TfIdfStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Inverse document frequency of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&index| self.idf[index])
    }
}

impl EmbeddingStrategy for TfIdfStrategy {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn train(&mut self, documents: &[String]) {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let unique: BTreeSet<String> = tokenize(document).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // Smoothed IDF: ln((N + 1) / (df + 1)) + 1
        let n = documents.len() as f32;
        self.vocabulary = HashMap::with_capacity(document_frequency.len());
        self.idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            self.idf.push(((n + 1.0) / (df as f32 + 1.0)).ln() + 1.0);
            self.vocabulary.insert(term, index);
        }
        self.trained = true;

        tracing::info!(
            documents = documents.len(),
            vocabulary_size = self.vocabulary.len(),
            "TF-IDF vocabulary built"
        );
    }

    fn generate(&self, text: &str) -> Result<Embedding, RankingError> {
        if !self.trained {
            return Ok(Embedding::zeros(1));
        }

        let tokens = tokenize(text);
        let mut vector = Embedding::zeros(self.vocabulary.len());
        if tokens.is_empty() {
            return Ok(vector);
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let total = tokens.len() as f32;
        for (term, count) in counts {
            if let Some(&index) = self.vocabulary.get(term) {
                vector[index] = (count as f32 / total) * self.idf[index];
            }
        }

        Ok(l2_normalize(vector))
    }

    fn dimension(&self) -> usize {
        if self.trained {
            self.vocabulary.len()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::cosine_similarity;

    fn corpus() -> Vec<String> {
        vec![
            "read file. filesystem. Read the contents of a file".to_string(),
            "write file. filesystem. Write data to a file".to_string(),
            "navigate. browser. Navigate to a URL".to_string(),
        ]
    }

    #[test]
    fn test_untrained_returns_placeholder() {
        let strategy = TfIdfStrategy::new();
        assert_eq!(strategy.dimension(), 0);
        assert_eq!(strategy.generate("anything").unwrap().len(), 1);
    }

    #[test]
    fn test_idf_formula() {
        let mut strategy = TfIdfStrategy::new();
        strategy.train(&corpus());

        // "file" appears in 2 of 3 documents, "navigate" in 1.
        let expected_file = (4.0f32 / 3.0).ln() + 1.0;
        let expected_navigate = (4.0f32 / 2.0).ln() + 1.0;
        assert!((strategy.idf("file").unwrap() - expected_file).abs() < 1e-6);
        assert!((strategy.idf("navigate").unwrap() - expected_navigate).abs() < 1e-6);
        assert!(strategy.idf("the").is_none());
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let mut strategy = TfIdfStrategy::new();
        strategy.train(&corpus());

        let v = strategy.generate("read a file").unwrap();
        assert_eq!(v.len(), strategy.dimension());
        assert!((v.dot(&v).sqrt() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_words_give_zero_vector() {
        let mut strategy = TfIdfStrategy::new();
        strategy.train(&corpus());

        let v = strategy.generate("quantum teleportation").unwrap();
        assert_eq!(v.len(), strategy.dimension());
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_similar_text_scores_higher() {
        let mut strategy = TfIdfStrategy::new();
        let docs = corpus();
        strategy.train(&docs);

        let query = strategy.generate("navigate url").unwrap();
        let nav = strategy.generate(&docs[2]).unwrap();
        let read = strategy.generate(&docs[0]).unwrap();
        assert!(cosine_similarity(&query, &nav) > cosine_similarity(&query, &read));
    }

    #[test]
    fn test_training_is_deterministic() {
        let mut a = TfIdfStrategy::new();
        let mut b = TfIdfStrategy::new();
        a.train(&corpus());
        b.train(&corpus());

        assert_eq!(a.generate("write data").unwrap(), b.generate("write data").unwrap());
    }
}
