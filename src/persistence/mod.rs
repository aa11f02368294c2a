//! Binary cache for parsed static word-vector tables.
//!
//! Pre-trained vector files are plain text and slow to parse. After the
//! first parse the table is written next to the text file in a compact
//! binary layout, and later startups read that instead.

use crate::error::RankingError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Cache file format version. Increment when format changes.
const CACHE_VERSION: u32 = 1;

/// Magic bytes to identify valid cache files.
const CACHE_MAGIC: &[u8; 8] = b"TSVECTAB";

/// Longest word accepted when reading a cache back.
const MAX_WORD_BYTES: usize = 1024;

/// Widest vector accepted when reading a cache back.
const MAX_DIMENSION: usize = 4096;

/// Fixed-size prefix of a cache file.
struct CacheHeader {
    version: u32,
    model_hash: [u8; 32],
    dimension: usize,
}

/// Parsed word-vector table with metadata for validation.
pub struct VectorTableCache {
    /// Format version for compatibility checking
    pub version: u32,
    /// SHA256 of the model identifier and dimension
    pub model_hash: [u8; 32],
    pub dimension: usize,
    pub vectors: HashMap<String, Vec<f32>>,
}

fn io_failure(what: &'static str) -> impl FnOnce(std::io::Error) -> RankingError {
    move |e| RankingError::StrategyUnavailable(format!("{}: {}", what, e))
}

impl VectorTableCache {
    pub fn compute_model_hash(model_id: &str, dimension: usize) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        hasher.update(b"|");
        hasher.update((dimension as u64).to_le_bytes());
        hasher.finalize().into()
    }

    pub fn new(model_id: &str, dimension: usize, vectors: HashMap<String, Vec<f32>>) -> Self {
        Self {
            version: CACHE_VERSION,
            model_hash: Self::compute_model_hash(model_id, dimension),
            dimension,
            vectors,
        }
    }

    /// Whether this cache was produced for the given model.
    pub fn is_valid_for(&self, model_id: &str, dimension: usize) -> bool {
        self.version == CACHE_VERSION
            && self.dimension == dimension
            && self.model_hash == Self::compute_model_hash(model_id, dimension)
    }

    /// Save cache to binary file.
    ///
    /// File format:
    /// - 8 bytes: magic "TSVECTAB"
    /// - 4 bytes: version (u32 LE)
    /// - 32 bytes: model_hash
    /// - 8 bytes: dimension (u64 LE)
    /// - 8 bytes: word count (u64 LE)
    /// - per word: length (u32 LE), UTF-8 bytes, `dimension` f32 LE
    ///
    /// Written to a sibling temp file and renamed into place, so a crash
    /// never leaves a truncated cache under the final name.
    pub fn save(&self, path: &Path) -> Result<(), RankingError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_failure("Failed to create cache directory"))?;
        }

        let temp_path = path.with_extension("bin.tmp");
        let file = File::create(&temp_path).map_err(io_failure("Failed to create cache file"))?;
        let mut writer = BufWriter::new(file);

        writer.write_all(CACHE_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.model_hash)?;
        writer.write_all(&(self.dimension as u64).to_le_bytes())?;
        writer.write_all(&(self.vectors.len() as u64).to_le_bytes())?;

        for (word, vector) in &self.vectors {
            if vector.len() != self.dimension {
                return Err(RankingError::EmbeddingFailure(format!(
                    "vector for '{}' has {} components, expected {}",
                    word,
                    vector.len(),
                    self.dimension
                )));
            }
            writer.write_all(&(word.len() as u32).to_le_bytes())?;
            writer.write_all(word.as_bytes())?;
            for &val in vector {
                writer.write_all(&val.to_le_bytes())?;
            }
        }

        writer.flush().map_err(io_failure("Failed to flush cache file"))?;
        drop(writer);
        fs::rename(&temp_path, path).map_err(io_failure("Failed to move cache into place"))?;

        tracing::info!(
            path = %path.display(),
            words = self.vectors.len(),
            dimension = self.dimension,
            "Vector table cache saved"
        );

        Ok(())
    }

    /// Whether the file at `path` starts with a header written for this
    /// model. Only the header is read; entries are not checked.
    pub fn header_matches(path: &Path, model_id: &str, dimension: usize) -> bool {
        let Ok(file) = File::open(path) else {
            return false;
        };
        match read_header(&mut BufReader::new(file), path) {
            Ok(Some(header)) => {
                header.dimension == dimension
                    && header.model_hash == Self::compute_model_hash(model_id, dimension)
            }
            _ => false,
        }
    }

    /// Load cache from binary file.
    ///
    /// Returns None if the file doesn't exist or has a foreign, stale or
    /// out-of-range header.
    pub fn load(path: &Path) -> Result<Option<Self>, RankingError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Cache file does not exist");
            return Ok(None);
        }

        let file = File::open(path).map_err(io_failure("Failed to open cache file"))?;
        let mut reader = BufReader::new(file);

        let Some(CacheHeader {
            version,
            model_hash,
            dimension,
        }) = read_header(&mut reader, path)?
        else {
            return Ok(None);
        };
        let count = u64::from_le_bytes(read_array(&mut reader)?) as usize;

        let mut vectors = HashMap::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            let word_len = u32::from_le_bytes(read_array(&mut reader)?) as usize;
            if word_len > MAX_WORD_BYTES {
                return Err(RankingError::EmbeddingFailure(format!(
                    "corrupt cache: word length {} exceeds {}",
                    word_len, MAX_WORD_BYTES
                )));
            }

            let mut word_bytes = vec![0u8; word_len];
            reader.read_exact(&mut word_bytes)?;
            let word = String::from_utf8(word_bytes).map_err(|e| {
                RankingError::EmbeddingFailure(format!("corrupt cache: {}", e))
            })?;

            let vector = (0..dimension)
                .map(|_| read_array(&mut reader).map(f32::from_le_bytes))
                .collect::<Result<Vec<f32>, _>>()?;
            vectors.insert(word, vector);
        }

        tracing::info!(
            path = %path.display(),
            words = vectors.len(),
            dimension,
            "Vector table cache loaded"
        );

        Ok(Some(Self {
            version,
            model_hash,
            dimension,
            vectors,
        }))
    }
}

/// Read and check the header. `Ok(None)` means the file is not a usable
/// cache of the current format.
fn read_header(reader: &mut impl Read, path: &Path) -> Result<Option<CacheHeader>, RankingError> {
    let mut magic = [0u8; 8];
    if reader.read_exact(&mut magic).is_err() || &magic != CACHE_MAGIC {
        tracing::warn!(path = %path.display(), "Invalid cache magic, ignoring");
        return Ok(None);
    }

    let version = u32::from_le_bytes(read_array(reader)?);
    if version != CACHE_VERSION {
        tracing::warn!(
            path = %path.display(),
            cache_version = version,
            expected_version = CACHE_VERSION,
            "Cache version mismatch, ignoring"
        );
        return Ok(None);
    }

    let model_hash: [u8; 32] = read_array(reader)?;
    let dimension = u64::from_le_bytes(read_array(reader)?);
    if dimension == 0 || dimension > MAX_DIMENSION as u64 {
        tracing::warn!(
            path = %path.display(),
            dimension,
            max_dimension = MAX_DIMENSION,
            "Cache dimension out of range, ignoring"
        );
        return Ok(None);
    }

    Ok(Some(CacheHeader {
        version,
        model_hash,
        dimension: dimension as usize,
    }))
}

fn read_array<const N: usize>(reader: &mut impl Read) -> Result<[u8; N], RankingError> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}
