//! Pre-trained static word vectors (GloVe 6B family).
//!
//! Models are downloaded once into a cache directory. The text file is
//! parsed on first load and a binary copy is kept alongside it; later loads
//! read the binary copy.

use super::lexical::tokenize;
use super::vector::{l2_normalize, Embedding};
use super::EmbeddingStrategy;
use crate::error::RankingError;
use crate::persistence::VectorTableCache;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A downloadable vector model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticVectorModel {
    pub id: &'static str,
    pub url: &'static str,
    pub filename: &'static str,
    pub dimension: usize,
}

const MODELS: &[StaticVectorModel] = &[
    StaticVectorModel {
        id: "6B.50d",
        url: "https://archive.org/download/glove.6B.50d-300d/glove.6B.50d.txt",
        filename: "glove.6B.50d.txt",
        dimension: 50,
    },
    StaticVectorModel {
        id: "6B.100d",
        url: "https://archive.org/download/glove.6B.50d-300d/glove.6B.100d.txt",
        filename: "glove.6B.100d.txt",
        dimension: 100,
    },
    StaticVectorModel {
        id: "6B.200d",
        url: "https://archive.org/download/glove.6B.50d-300d/glove.6B.200d.txt",
        filename: "glove.6B.200d.txt",
        dimension: 200,
    },
    StaticVectorModel {
        id: "6B.300d",
        url: "https://archive.org/download/glove.6B.50d-300d/glove.6B.300d.txt",
        filename: "glove.6B.300d.txt",
        dimension: 300,
    },
];

impl StaticVectorModel {
    pub fn lookup(id: &str) -> Option<&'static StaticVectorModel> {
        MODELS.iter().find(|model| model.id == id)
    }

    pub fn available() -> impl Iterator<Item = &'static str> {
        MODELS.iter().map(|model| model.id)
    }

    pub fn text_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.filename)
    }

    pub fn binary_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("{}.bin", self.filename))
    }

    /// Whether a load can proceed without touching the network: the text
    /// file is present, or the binary copy carries this model's header.
    pub fn is_cached(&self, cache_dir: &Path) -> bool {
        let binary_path = self.binary_path(cache_dir);
        self.text_path(cache_dir).exists()
            || VectorTableCache::header_matches(&binary_path, self.id, self.dimension)
    }
}

pub struct StaticVectorStrategy {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl StaticVectorStrategy {
    /// Build from an in-memory table. Entries of the wrong length are dropped.
    pub fn from_table(mut vectors: HashMap<String, Vec<f32>>, dimension: usize) -> Self {
        vectors.retain(|_, vector| vector.len() == dimension);
        Self { vectors, dimension }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }

    /// Load a model that is already on disk, preferring the binary cache.
    ///
    /// # Errors
    /// `StrategyUnavailable` if neither the binary cache nor the text file
    /// exists, or the text file cannot be read.
    pub fn load_cached(
        model: &StaticVectorModel,
        cache_dir: &Path,
    ) -> Result<Self, RankingError> {
        let binary_path = model.binary_path(cache_dir);
        match VectorTableCache::load(&binary_path) {
            Ok(Some(cache)) if cache.is_valid_for(model.id, model.dimension) => {
                tracing::info!(
                    model = model.id,
                    vocabulary_size = cache.vectors.len(),
                    "Using cached static vectors"
                );
                return Ok(Self::from_table(cache.vectors, model.dimension));
            }
            Ok(Some(_)) => {
                tracing::warn!(model = model.id, "Vector cache belongs to another model, reparsing");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(model = model.id, error = %e, "Vector cache unreadable, reparsing");
            }
        }

        let text_path = model.text_path(cache_dir);
        if !text_path.exists() {
            return Err(RankingError::StrategyUnavailable(format!(
                "model {} is not present in {}",
                model.id,
                cache_dir.display()
            )));
        }

        let file = File::open(&text_path).map_err(|e| {
            RankingError::StrategyUnavailable(format!(
                "failed to open {}: {}",
                text_path.display(),
                e
            ))
        })?;
        let vectors = parse_vector_table(BufReader::new(file), model.dimension)?;

        let cache = VectorTableCache::new(model.id, model.dimension, vectors);
        if let Err(e) = cache.save(&binary_path) {
            tracing::warn!(error = %e, "Failed to write vector cache");
        }

        tracing::info!(
            model = model.id,
            vocabulary_size = cache.vectors.len(),
            dimension = model.dimension,
            "Static vectors ready"
        );

        Ok(Self::from_table(cache.vectors, model.dimension))
    }

    /// Download the model if it is not cached yet, then load it.
    pub async fn fetch_and_load(
        model: &'static StaticVectorModel,
        cache_dir: PathBuf,
    ) -> Result<Self, RankingError> {
        if model.is_cached(&cache_dir) {
            tracing::info!(model = model.id, path = %cache_dir.display(), "Using cached model");
        } else {
            download(model.url, &model.text_path(&cache_dir)).await?;
        }

        tokio::task::spawn_blocking(move || Self::load_cached(model, &cache_dir))
            .await
            .map_err(|e| RankingError::StrategyUnavailable(format!("loader task failed: {}", e)))?
    }
}

impl EmbeddingStrategy for StaticVectorStrategy {
    fn name(&self) -> &'static str {
        "static_vectors"
    }

    fn generate(&self, text: &str) -> Result<Embedding, RankingError> {
        let mut sum = Embedding::zeros(self.dimension);
        let mut known = 0usize;

        for token in tokenize(text) {
            if let Some(vector) = self.vectors.get(&token) {
                sum.iter_mut().zip(vector).for_each(|(acc, &x)| *acc += x);
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

/// Parse `word v1 v2 ... vD` lines. Lines with a different component count
/// or an unparseable number are skipped.
pub fn parse_vector_table<R: BufRead>(
    reader: R,
    dimension: usize,
) -> Result<HashMap<String, Vec<f32>>, RankingError> {
    let mut vectors = HashMap::new();
    let mut skipped = 0usize;

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line_number > 0 && line_number % 100_000 == 0 {
            tracing::info!(loaded = vectors.len(), "Loading static vectors");
        }

        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };

        let values: Result<Vec<f32>, _> = parts.map(str::parse::<f32>).collect();
        match values {
            Ok(vector) if vector.len() == dimension => {
                vectors.insert(word.to_string(), vector);
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, dimension, "Skipped malformed vector lines");
    }

    Ok(vectors)
}

async fn download(url: &str, dest: &Path) -> Result<(), RankingError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::info!(url, path = %dest.display(), "Downloading static vector model");

    let mut response = reqwest::get(url)
        .await
        .map_err(|e| RankingError::StrategyUnavailable(format!("download failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(RankingError::StrategyUnavailable(format!(
            "download failed with status: {}",
            response.status()
        )));
    }

    // Stream into a partial file so an interrupted download is never
    // mistaken for a cached model.
    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| RankingError::StrategyUnavailable(format!("download interrupted: {}", e)))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, dest).await?;

    tracing::info!(size_mb = written / (1024 * 1024), "Download complete");
    Ok(())
}
