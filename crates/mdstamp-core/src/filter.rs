//! Eligibility of vault paths for stamping.

use std::path::{Component, Path};

/// Top-level folders whose documents are never stamped.
pub const DEFAULT_IGNORED_PREFIXES: &[&str] = &[".git", ".obsidian", "archive", "assets", "templates"];

/// Extension of the documents mdstamp manages.
pub const DEFAULT_EXTENSION: &str = "md";

/// Decides which documents are processed.
///
/// A document is eligible when it has the document extension, lives in a
/// folder below the vault root (never directly in it), and its top-level
/// folder does not start with one of the ignored prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    extension: String,
    ignored_prefixes: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSION,
            DEFAULT_IGNORED_PREFIXES.iter().map(ToString::to_string).collect(),
        )
    }
}

impl PathFilter {
    #[must_use]
    pub fn new(extension: impl Into<String>, ignored_prefixes: Vec<String>) -> Self {
        Self {
            extension: extension.into(),
            ignored_prefixes,
        }
    }

    /// Eligibility from an extension and the folder chain from the vault
    /// root down to the document's parent. An empty chain means the parent
    /// is the root.
    #[must_use]
    pub fn is_eligible(&self, extension: Option<&str>, folders: &[&str]) -> bool {
        if extension != Some(self.extension.as_str()) {
            return false;
        }
        match folders.first() {
            None => false,
            Some(top) => !self.is_ignored_folder(top),
        }
    }

    /// Eligibility of a path relative to the vault root.
    #[must_use]
    pub fn is_eligible_path(&self, relative: &Path) -> bool {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => match part.to_str() {
                    Some(part) => parts.push(part),
                    None => return false,
                },
                Component::CurDir => {}
                // Anything escaping or re-rooting the vault is out of scope.
                _ => return false,
            }
        }
        if parts.is_empty() {
            return false;
        }
        let extension = relative.extension().and_then(|e| e.to_str());
        self.is_eligible(extension, &parts[..parts.len() - 1])
    }

    /// Whether a top-level folder is excluded, along with everything below it.
    #[must_use]
    pub fn is_ignored_folder(&self, name: &str) -> bool {
        self.ignored_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}
