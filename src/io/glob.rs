//! Glob expansion for input arguments such as `dumps/*.json.gz`.

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::PathBuf;

/// Files matching `pattern`, sorted so runs are reproducible.
///
/// Directories are skipped. Supports `*`, `?`, `**` and `[...]` classes.
///
/// # Errors
/// Returns an error for an invalid pattern or an unreadable directory entry.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
/// As [`expand_glob`], plus when nothing matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}
