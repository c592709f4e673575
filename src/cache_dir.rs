use std::path::{Path, PathBuf};

use crate::{
    cache::cache_file_name,
    error::{Error, Result},
};

pub const CACHE_DIR_ENV_VAR: &str = "LINESIFT_CACHE_DIR";

/// Directory holding embedding cache records.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Pick the cache directory: `explicit` (from --cache-dir) if given,
    /// otherwise `$LINESIFT_CACHE_DIR`, otherwise `~/.cache/linesift`.
    /// The directory is created when missing.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CACHE_DIR_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    xdg::BaseDirectories::with_prefix("linesift")
                        .get_cache_home()
                })
                .ok_or_else(|| {
                    Error::Config("no cache directory: set --cache-dir".into())
                })?,
        };

        if let Err(e) = std::fs::create_dir_all(&root) {
            tracing::debug!(path = %root.display(), error = %e, "mkdir failed");
            return Err(Error::CacheDir(root));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the cache record for a corpus embedded with `model_id`.
    pub fn record_path(&self, corpus_path: &Path, model_id: &str) -> PathBuf {
        self.root.join(cache_file_name(corpus_path, model_id))
    }
}
