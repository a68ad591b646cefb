//! Handles one create/modify notification for one document.
//!
//! Pipeline: path filter → stat → read → fingerprint → header
//! read-modify-write → outcome. A malformed header raises exactly one
//! user notice and leaves the document untouched.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use mdstamp_core::frontmatter;
use mdstamp_core::timestamp::local_from_millis;
use mdstamp_core::{
    Config, FieldNames, HeaderFields, IgnoreReason, PathFilter, StampError, Stamper,
};

use crate::notifier::Notifier;
use crate::outcome::Outcome;
use crate::store::{relative_to, DocumentRef, DocumentStore};

/// Runs the stamping pipeline against a document store.
#[derive(Debug)]
pub struct Handler<S, N> {
    store: S,
    notifier: N,
    filter: PathFilter,
    stamper: Stamper,
    fields: FieldNames,
    dry_run: bool,
}

impl<S: DocumentStore, N: Notifier> Handler<S, N> {
    #[must_use]
    pub fn new(store: S, notifier: N, config: &Config) -> Self {
        Self {
            store,
            notifier,
            filter: config.path_filter(),
            stamper: config.stamper(),
            fields: config.fields.clone(),
            dry_run: false,
        }
    }

    /// In a dry run, documents that need a write are reported as
    /// [`Outcome::Ok`] but never written.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Handle a document by path, absolute or relative to the vault root.
    ///
    /// Ineligible paths are rejected before the file is looked at.
    pub fn handle_path(&self, path: &Path) -> Outcome {
        let eligible = relative_to(self.store.root(), path)
            .is_some_and(|relative| self.filter.is_eligible_path(&relative));
        if !eligible {
            debug!(path = %path.display(), "ignored: ineligible");
            return Outcome::ignored(IgnoreReason::Ineligible);
        }

        match self.store.stat(path) {
            Ok(doc) => self.handle(&doc),
            Err(StampError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "ignored: missing");
                Outcome::ignored(IgnoreReason::Missing)
            }
            Err(e) => self.failed(path, &e),
        }
    }

    /// Handle a resolved document.
    pub fn handle(&self, doc: &DocumentRef) -> Outcome {
        if !self.filter.is_eligible(doc.extension(), &doc.folders()) {
            debug!(path = %doc.relative.display(), "ignored: ineligible");
            return Outcome::ignored(IgnoreReason::Ineligible);
        }

        let content = match self.store.read(doc) {
            Ok(content) => content,
            Err(StampError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Outcome::ignored(IgnoreReason::Missing);
            }
            Err(e) => return self.failed(&doc.relative, &e),
        };

        let hash = match self.stamper.fingerprint_body(&content) {
            Ok(hash) => hash,
            Err(reason) => {
                debug!(path = %doc.relative.display(), %reason, "ignored");
                return Outcome::ignored(reason);
            }
        };

        let created_at = local_from_millis(doc.created_ms);
        let modified_at = local_from_millis(doc.modified_ms);
        let mutate = |header: &serde_yaml::Mapping| {
            let existing = HeaderFields::from_mapping(header, &self.fields);
            self.stamper
                .plan(&existing, &hash, &created_at, &modified_at)
                .map(|update| update.apply(header, &self.fields))
        };

        let result = if self.dry_run {
            frontmatter::read_header(&content).map(|header| mutate(&header).is_some())
        } else {
            self.store.process_header(doc, mutate)
        };

        match result {
            Ok(true) => {
                info!(path = %doc.relative.display(), hash = %hash, dry_run = self.dry_run, "stamped");
                Outcome::Ok
            }
            Ok(false) => {
                debug!(path = %doc.relative.display(), "ignored: up to date");
                Outcome::ignored(IgnoreReason::UpToDate)
            }
            Err(e) if e.is_parse() => {
                let message = format!(
                    "timestamps not updated, malformed frontmatter in {}: {e}",
                    doc.relative.display()
                );
                self.notifier.notify(&message);
                Outcome::Error { message }
            }
            Err(e) => self.failed(&doc.relative, &e),
        }
    }

    fn failed(&self, path: &Path, err: &StampError) -> Outcome {
        warn!(path = %path.display(), error = %err, "failed to process document");
        Outcome::Error {
            message: format!("{}: {err}", path.display()),
        }
    }
}
