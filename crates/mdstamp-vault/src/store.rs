//! The document store: reading documents and rewriting their header.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_yaml::{Mapping, Value};

use mdstamp_core::error::StampError;
use mdstamp_core::frontmatter;

/// A document in the vault, as seen at the time of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the vault root.
    pub relative: PathBuf,
    /// Creation time in epoch milliseconds.
    pub created_ms: i64,
    /// Last modification time in epoch milliseconds.
    pub modified_ms: i64,
}

impl DocumentRef {
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }

    /// Folder names from the vault root down to the parent of the document.
    #[must_use]
    pub fn folders(&self) -> Vec<&str> {
        self.relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => part.to_str(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Capabilities the handler needs from wherever documents live.
pub trait DocumentStore {
    /// Root directory of the vault.
    fn root(&self) -> &Path;

    /// Resolve a path (absolute, or relative to the root) into a document
    /// reference with current timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the document cannot be inspected.
    fn stat(&self, path: &Path) -> Result<DocumentRef, StampError>;

    /// Read the full text of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the document cannot be read.
    fn read(&self, doc: &DocumentRef) -> Result<String, StampError>;

    /// Read-modify-write of the header mapping.
    ///
    /// `mutate` receives the current header and returns the new one, or
    /// `None` to leave the document alone. Returns whether the document was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Parse`] if the existing header is malformed, in
    /// which case the document is not touched, and [`StampError::Io`] for
    /// failures reading or writing it.
    fn process_header<F>(&self, doc: &DocumentRef, mutate: F) -> Result<bool, StampError>
    where
        F: FnOnce(&Mapping) -> Option<Mapping>;
}

/// A vault stored as a directory tree of markdown files.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a vault directory.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the directory does not exist.
    pub fn open(root: &Path) -> Result<Self, StampError> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(StampError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }
        Ok(Self { root })
    }

    /// Relative location of `path` inside the vault, if it is inside.
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        relative_to(&self.root, path)
    }
}

/// Relative location of `path` inside `root`. Absolute paths that don't
/// match `root` verbatim are retried in canonical form, since watchers may
/// report paths through a different symlink chain.
pub(crate) fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_relative() {
        return Some(path.to_path_buf());
    }
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }
    let canonical = path
        .parent()
        .and_then(|parent| parent.canonicalize().ok())
        .zip(path.file_name())
        .map(|(parent, name)| parent.join(name))?;
    canonical.strip_prefix(root).ok().map(Path::to_path_buf)
}

fn epoch_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

impl DocumentStore for FsStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn stat(&self, path: &Path) -> Result<DocumentRef, StampError> {
        let relative = self
            .relative_path(path)
            .filter(|rel| rel.components().all(|c| matches!(c, Component::Normal(_))))
            .ok_or_else(|| {
                StampError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is outside the vault", path.display()),
                ))
            })?;
        let path = self.root.join(&relative);
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(StampError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )));
        }

        let modified = metadata.modified()?;
        // Not every file system records birth time.
        let created = metadata.created().unwrap_or(modified);

        Ok(DocumentRef {
            path,
            relative,
            created_ms: epoch_millis(created),
            modified_ms: epoch_millis(modified),
        })
    }

    fn read(&self, doc: &DocumentRef) -> Result<String, StampError> {
        Ok(fs::read_to_string(&doc.path)?)
    }

    fn process_header<F>(&self, doc: &DocumentRef, mutate: F) -> Result<bool, StampError>
    where
        F: FnOnce(&Mapping) -> Option<Mapping>,
    {
        let content = fs::read_to_string(&doc.path)?;
        let current = frontmatter::read_header(&content)?;
        let Some(updated) = mutate(&current) else {
            return Ok(false);
        };

        let mut changes = Vec::new();
        for (key, value) in &updated {
            if current.get(key) == Some(value) {
                continue;
            }
            match (key, value) {
                (Value::String(key), Value::String(value)) => {
                    changes.push((key.as_str(), value.as_str()));
                }
                _ => {
                    return Err(StampError::Serialization(format!(
                        "only string header values can be written, got {key:?}: {value:?}"
                    )));
                }
            }
        }
        if changes.is_empty() {
            return Ok(false);
        }

        let output = frontmatter::set_header_fields(&content, &changes)?;
        fs::write(&doc.path, output)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn stat_resolves_relative_and_absolute_paths() {
        let (_dir, store) = vault();
        let file = store.root().join("notes").join("a.md");
        fs::write(&file, "Body").unwrap();

        let by_relative = store.stat(Path::new("notes/a.md")).unwrap();
        let by_absolute = store.stat(&file).unwrap();
        assert_eq!(by_relative, by_absolute);
        assert_eq!(by_relative.relative, PathBuf::from("notes/a.md"));
        assert_eq!(by_relative.extension(), Some("md"));
        assert_eq!(by_relative.folders(), vec!["notes"]);
        assert!(by_relative.modified_ms > 0);
        assert!(by_relative.created_ms > 0);
    }

    #[test]
    fn stat_rejects_paths_outside_vault() {
        let (_dir, store) = vault();
        let other = tempfile::tempdir().unwrap();
        let file = other.path().join("x.md");
        fs::write(&file, "Body").unwrap();
        assert!(store.stat(&file).is_err());
    }

    #[test]
    fn stat_of_missing_file_is_not_found() {
        let (_dir, store) = vault();
        match store.stat(Path::new("notes/gone.md")) {
            Err(StampError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn process_header_writes_only_changed_keys() {
        let (_dir, store) = vault();
        let file = store.root().join("notes").join("a.md");
        fs::write(&file, "---\n# comment\ntitle: Note\n---\nBody\n").unwrap();
        let doc = store.stat(&file).unwrap();

        let written = store
            .process_header(&doc, |current| {
                let mut next = current.clone();
                next.insert(Value::from("title"), Value::from("Note"));
                next.insert(Value::from("hash"), Value::from("abc"));
                Some(next)
            })
            .unwrap();
        assert!(written);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "---\n# comment\ntitle: Note\nhash: abc\n---\nBody\n"
        );
    }

    #[test]
    fn process_header_skips_write_when_nothing_changes() {
        let (_dir, store) = vault();
        let file = store.root().join("notes").join("a.md");
        fs::write(&file, "---\nhash: abc\n---\nBody\n").unwrap();
        let doc = store.stat(&file).unwrap();

        assert!(!store.process_header(&doc, |_| None).unwrap());
        assert!(!store
            .process_header(&doc, |current| Some(current.clone()))
            .unwrap());
    }

    #[test]
    fn process_header_leaves_malformed_document_untouched() {
        let (_dir, store) = vault();
        let file = store.root().join("notes").join("bad.md");
        let original = "---\ntitle: [oops\n---\nBody\n";
        fs::write(&file, original).unwrap();
        let doc = store.stat(&file).unwrap();

        let err = store
            .process_header(&doc, |current| Some(current.clone()))
            .unwrap_err();
        assert!(err.is_parse());
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
    }
}
