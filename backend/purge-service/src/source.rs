//! Identifier source - reads the list of logical asset identifiers to purge

use crate::error::{PurgeError, Result};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_IDENTIFIER_FILE: &str = "FileNamesToDelete.txt";

/// Read identifiers from a text file, one per line.
///
/// Returns [`PurgeError::EmptyInput`] when the file holds no usable lines.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|source| PurgeError::Source {
        path: path.display().to_string(),
        source,
    })?;

    let identifiers = parse_identifiers(&contents);
    if identifiers.is_empty() {
        return Err(PurgeError::EmptyInput(path.display().to_string()));
    }

    tracing::debug!(
        path = %path.display(),
        count = identifiers.len(),
        "Loaded identifiers"
    );

    Ok(identifiers)
}

/// Trim every line, drop blanks and `#` comments, keep the first occurrence of duplicates.
pub fn parse_identifiers(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}
