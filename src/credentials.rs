use std::path::Path;

use crate::error::StartupError;

/// Reads the newline-delimited credentials file. Each trimmed non-blank line
/// is one opaque credential; relative order is preserved for the rest of the
/// pipeline.
pub fn load(path: &Path) -> Result<Vec<String>, StartupError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        StartupError::CredentialsUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
