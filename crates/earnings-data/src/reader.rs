//! Loading of pasted export text from a file or stdin.

use std::io::Read;
use std::path::Path;

use earnings_core::error::{EarningsError, Result};
use tracing::debug;

/// Read the export at `path`, or all of stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => read_file(p),
        None => read_from(std::io::stdin().lock()),
    }
}

/// Read an export file into memory.
pub fn read_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|source| EarningsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Read everything from `reader`.
pub fn read_from(mut reader: impl Read) -> Result<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}
