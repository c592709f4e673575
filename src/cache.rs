//! Content-addressed embedding cache.
//!
//! A cache record holds one vector per corpus line together with the
//! SHA-256 of the corpus bytes and the model that produced the vectors. A
//! record is reused only when both match the current request; anything
//! else (missing file, stale fingerprint, other model, other schema
//! version, unparseable JSON) leads to a full rebuild.

use std::{
    fmt::Write as _,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::{
    corpus,
    error::{Error, Result},
    provider::EmbeddingProvider,
};

/// Bumped whenever the on-disk layout of [`CacheRecord`] changes.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

const FINGERPRINT_CHUNK_SIZE: usize = 1024 * 1024;

/// A persisted snapshot of corpus lines and their embeddings.
///
/// `vectors[i]` is the embedding of `lines[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub schema_version: u32,
    #[serde(rename = "embed_model")]
    pub model_id: String,
    #[serde(rename = "file_sha256")]
    pub fingerprint: String,
    pub lines: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

impl CacheRecord {
    /// Assemble a record, checking that vectors line up with lines and
    /// share a single dimension.
    pub fn new(
        model_id: String,
        fingerprint: String,
        lines: Vec<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let record = Self {
            schema_version: CACHE_SCHEMA_VERSION,
            model_id,
            fingerprint,
            lines,
            vectors,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vectors.len() != self.lines.len() {
            return Err(Error::Misaligned {
                lines: self.lines.len(),
                vectors: self.vectors.len(),
            });
        }
        if let Some(expected) = self.dimension()
            && let Some(bad) =
                self.vectors.iter().find(|v| v.len() != expected)
        {
            return Err(Error::DimensionMismatch {
                expected,
                found: bad.len(),
            });
        }
        if let Some(index) = self
            .vectors
            .iter()
            .position(|v| v.iter().any(|x| !x.is_finite()))
        {
            return Err(Error::NonFiniteVector { index });
        }
        Ok(())
    }

    /// Embedding dimension, or `None` for an empty corpus.
    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}

/// Hex-encoded SHA-256 of a file's bytes, read in 1 MiB chunks.
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::CorpusNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; FINGERPRINT_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(to_hex(&hasher.finalize()))
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// What was found at the cache location, relative to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    Fresh,
    /// Fingerprint or model differ from the request.
    Stale { reason: String },
    /// Written by a different schema version.
    Incompatible { found: u32 },
    /// Could not be read or parsed, or violates its own invariants.
    Unreadable { reason: String },
}

/// How [`EmbeddingCache::load_or_build`] obtained its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Reused,
    Built { cause: CacheStatus },
    Forced,
}

impl CacheOutcome {
    pub fn rebuilt(&self) -> bool {
        !matches!(self, Self::Reused)
    }
}

/// A single cache record file on disk.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    path: PathBuf,
}

impl EmbeddingCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw record without judging whether it is still valid.
    ///
    /// Returns `None` if the file does not exist.
    pub fn read(&self) -> Result<Option<CacheRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Classify the file at the cache location against a request.
    ///
    /// Returns the record alongside the status when it is fresh.
    pub fn inspect(
        &self,
        fingerprint: &str,
        model_id: &str,
    ) -> (CacheStatus, Option<CacheRecord>) {
        let record = match self.read() {
            Ok(Some(record)) => record,
            Ok(None) => return (CacheStatus::Missing, None),
            Err(e) => {
                return (
                    CacheStatus::Unreadable {
                        reason: e.to_string(),
                    },
                    None,
                );
            }
        };

        if record.schema_version != CACHE_SCHEMA_VERSION {
            return (
                CacheStatus::Incompatible {
                    found: record.schema_version,
                },
                None,
            );
        }
        if let Err(e) = record.validate() {
            return (
                CacheStatus::Unreadable {
                    reason: e.to_string(),
                },
                None,
            );
        }
        if record.fingerprint != fingerprint {
            return (
                CacheStatus::Stale {
                    reason: "corpus fingerprint changed".into(),
                },
                None,
            );
        }
        if record.model_id != model_id {
            return (
                CacheStatus::Stale {
                    reason: format!(
                        "model changed from {} to {model_id}",
                        record.model_id
                    ),
                },
                None,
            );
        }

        (CacheStatus::Fresh, Some(record))
    }

    /// Persist a record, replacing whatever was there.
    ///
    /// The record is written to a temporary file in the same directory and
    /// renamed into place, so readers never observe a partial write.
    pub fn write(&self, record: &CacheRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, record)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Delete the cache file if present.
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Return the cached embeddings for `corpus_path`, computing and
    /// persisting them first if the cache cannot be reused.
    ///
    /// When the stored fingerprint and model both match, no embedding
    /// call is made. Otherwise the corpus is re-read and embedded in one
    /// batch. `force_rebuild` discards any existing record first.
    pub fn load_or_build(
        &self,
        corpus_path: &Path,
        model_id: &str,
        force_rebuild: bool,
        provider: &dyn EmbeddingProvider,
    ) -> Result<(CacheRecord, CacheOutcome)> {
        let fingerprint = fingerprint(corpus_path)?;

        let outcome = if force_rebuild {
            let removed = self.remove()?;
            debug!(path = %self.path.display(), removed, "forced cache rebuild");
            CacheOutcome::Forced
        } else {
            let (status, record) = self.inspect(&fingerprint, model_id);
            if let Some(record) = record {
                debug!(path = %self.path.display(), "reusing embedding cache");
                return Ok((record, CacheOutcome::Reused));
            }
            match &status {
                CacheStatus::Unreadable { reason } => warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "discarding unreadable embedding cache"
                ),
                CacheStatus::Incompatible { found } => warn!(
                    path = %self.path.display(),
                    found,
                    expected = CACHE_SCHEMA_VERSION,
                    "discarding cache written by another schema version"
                ),
                _ => debug!(?status, "embedding cache not reusable"),
            }
            CacheOutcome::Built { cause: status }
        };

        // Stored fingerprint and lines come from one read of the corpus.
        let text = corpus::read_text(corpus_path)?;
        let fingerprint = to_hex(&Sha256::digest(text.as_bytes()));
        let lines = corpus::split_lines(&text);
        let vectors = if lines.is_empty() {
            Vec::new()
        } else {
            provider.embed(&lines, model_id)?
        };
        info!(
            lines = lines.len(),
            model = model_id,
            "built embedding cache"
        );

        let record =
            CacheRecord::new(model_id.to_string(), fingerprint, lines, vectors)?;
        self.write(&record)?;

        Ok((record, outcome))
    }
}

/// File name for the cache record of `corpus_path` under `model_id`:
/// `<stem>-<path hash>.<model>.cache.json`.
///
/// The path hash keeps corpora with the same file name in different
/// directories apart when they share a cache directory.
pub fn cache_file_name(corpus_path: &Path, model_id: &str) -> String {
    let stem = corpus_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus".to_string());

    let absolute = std::path::absolute(corpus_path)
        .unwrap_or_else(|_| corpus_path.to_path_buf());
    let path_hash =
        to_hex(&Sha256::digest(absolute.to_string_lossy().as_bytes()));

    format!(
        "{}-{}.{}.cache.json",
        sanitize(&stem),
        &path_hash[..8],
        sanitize(model_id)
    )
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
