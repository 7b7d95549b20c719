//! Filesystem helpers for build directories.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recreate a directory from scratch, discarding anything a previous run
/// left behind.
pub fn prepare_fresh_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to clear directory {}", path.display()))?;
    }
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    Ok(())
}

/// Create a fresh subdirectory under a parent, returning its path.
pub fn prepare_work_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    let dir = parent.join(name);
    prepare_fresh_dir(&dir)?;
    Ok(dir)
}

/// Copy a directory tree verbatim into an existing destination directory.
///
/// Missing sources are fine (the static files directory is optional);
/// regular files and directories are copied, anything else is skipped.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry
            .with_context(|| format!("Failed to walk static directory {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("Unexpected path outside {}", source.display()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {}", target.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}
