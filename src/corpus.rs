use std::path::Path;

use crate::error::{Error, Result};

/// Read a corpus file into its non-empty, whitespace-trimmed lines.
///
/// Line order is preserved; result indices elsewhere refer to positions in
/// the returned vector.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    Ok(split_lines(&read_text(path)?))
}

/// Read the whole corpus file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::CorpusNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

/// Split text into trimmed lines, dropping the blank ones.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
