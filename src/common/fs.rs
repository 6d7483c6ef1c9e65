use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

/// Create `path` and its parents unless it already is a directory.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() { return Ok(()) }
    if path.exists() {
        bail!("[fs] {} exists but is not a directory", path.display());
    }
    fs::create_dir_all(path)
        .with_context(|| format!("[fs] Failed to create directory {}", path.display()))
}
