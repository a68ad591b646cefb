//! Walking a vault for every eligible document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use mdstamp_core::error::StampError;
use mdstamp_core::PathFilter;

/// Collect the paths of all eligible documents under `root`, relative to
/// it and sorted.
///
/// Ignored top-level folders are not descended into, and symlinked
/// directories are not followed. Entries that cannot be read are logged
/// and skipped.
///
/// # Errors
///
/// Returns [`StampError::Io`] if `root` itself is not a readable directory.
pub fn scan_vault(root: &Path, filter: &PathFilter) -> Result<Vec<PathBuf>, StampError> {
    if !fs::metadata(root)?.is_dir() {
        return Err(StampError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root.display()),
        )));
    }

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_ignored_top_level(entry, filter))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable vault entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|relative| filter.is_eligible_path(relative))
        .collect();

    found.sort();
    Ok(found)
}

fn is_ignored_top_level(entry: &DirEntry, filter: &PathFilter) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_none_or(|name| filter.is_ignored_folder(name))
}
