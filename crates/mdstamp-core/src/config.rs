//! Vault configuration.
//!
//! Read from `.mdstamp.toml` at the vault root when present:
//! ```toml
//! extension = "md"
//! ignored_prefixes = [".git", ".obsidian", "archive", "assets", "templates"]
//! timestamp_format = "%Y-%m-%dT%H:%M"
//!
//! [fields]
//! created = "created"
//! modified = "modified"
//! hash = "hash"
//! ```
//! Every key is optional; missing keys take the defaults shown above.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decision::Stamper;
use crate::error::StampError;
use crate::filter::{PathFilter, DEFAULT_EXTENSION, DEFAULT_IGNORED_PREFIXES};
use crate::header::FieldNames;
use crate::timestamp::{is_valid_format, DEFAULT_FORMAT};

/// File name of the per-vault configuration.
pub const CONFIG_FILE_NAME: &str = ".mdstamp.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extension of managed documents, without the dot.
    pub extension: String,
    /// Top-level folder prefixes that are never stamped.
    pub ignored_prefixes: Vec<String>,
    /// strftime-style format of `created` and `modified`.
    pub timestamp_format: String,
    pub fields: FieldNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            ignored_prefixes: DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            timestamp_format: DEFAULT_FORMAT.to_string(),
            fields: FieldNames::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Config`] on invalid TOML, unknown keys, or
    /// values that fail [`Config::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, StampError> {
        let config: Self = toml::from_str(text).map_err(|e| StampError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the file cannot be read and
    /// [`StampError::Config`] if it is invalid.
    pub fn load(path: &Path) -> Result<Self, StampError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| match e {
            StampError::Config(message) => {
                StampError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Load `.mdstamp.toml` from the vault root, or the defaults if the vault
    /// has none.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_for_vault(vault_root: &Path) -> Result<Self, StampError> {
        let path = vault_root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check the values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), StampError> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(StampError::Config(format!(
                "extension must be non-empty and given without a dot, got '{}'",
                self.extension
            )));
        }
        if self.ignored_prefixes.iter().any(String::is_empty) {
            return Err(StampError::Config(
                "ignored_prefixes must not contain an empty prefix".to_string(),
            ));
        }
        if !is_valid_format(&self.timestamp_format) {
            return Err(StampError::Config(format!(
                "invalid timestamp_format '{}'",
                self.timestamp_format
            )));
        }

        let names = [
            &self.fields.created,
            &self.fields.modified,
            &self.fields.hash,
        ];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(StampError::Config("field names must not be empty".to_string()));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(StampError::Config("field names must be distinct".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(self.extension.clone(), self.ignored_prefixes.clone())
    }

    #[must_use]
    pub fn stamper(&self) -> Stamper {
        Stamper::new(self.timestamp_format.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.path_filter(), PathFilter::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = Config::from_toml_str(
            "timestamp_format = \"%Y-%m-%d %H:%M\"\n[fields]\nhash = \"checksum\"\n",
        )
        .unwrap();
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M");
        assert_eq!(config.fields.hash, "checksum");
        assert_eq!(config.fields.created, "created");
        assert_eq!(config.extension, "md");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml_str("extensions = [\"md\"]\n").unwrap_err();
        assert!(matches!(err, StampError::Config(_)));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_toml_str("extension = \".md\"\n").is_err());
        assert!(Config::from_toml_str("timestamp_format = \"%Q\"\n").is_err());
        assert!(Config::from_toml_str("ignored_prefixes = [\"\"]\n").is_err());
        assert!(Config::from_toml_str("[fields]\nmodified = \"created\"\n").is_err());
    }

    #[test]
    fn load_for_vault_reads_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_for_vault(dir.path()).unwrap(), Config::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "ignored_prefixes = [\"private\"]\n",
        )
        .unwrap();
        let config = Config::load_for_vault(dir.path()).unwrap();
        assert_eq!(config.ignored_prefixes, vec!["private".to_string()]);
    }

    #[test]
    fn load_reports_path_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "extension = 3\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
