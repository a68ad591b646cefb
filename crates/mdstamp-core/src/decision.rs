//! The change decision engine.
//!
//! Given a document's raw content, its creation and modification times and
//! the managed header fields it already carries, decide whether the header
//! needs to be written and with which values.
//!
//! Two guards keep the process idempotent and stop it from reacting to its
//! own writes:
//! - if the fresh fingerprint already appears anywhere in the raw content,
//!   the current state was recorded before and nothing is written;
//! - if all three fields are present and either `modified` or `hash` already
//!   matches its fresh value, nothing is written.
//!
//! `created` is only ever filled in when missing.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::fingerprint::fingerprint;
use crate::frontmatter::extract_body;
use crate::header::{HeaderFields, HeaderUpdate};
use crate::timestamp::{format_timestamp, DEFAULT_FORMAT};

/// Why a document was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Filtered out by extension or location.
    Ineligible,
    /// Gone by the time it was looked at.
    Missing,
    /// Nothing but whitespace below the header.
    EmptyBody,
    /// The fingerprint of the current body is already in the file.
    AlreadyRecorded,
    /// The header already reflects the current modification time or body.
    UpToDate,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Ineligible => "ineligible",
            Self::Missing => "missing",
            Self::EmptyBody => "empty body",
            Self::AlreadyRecorded => "already recorded",
            Self::UpToDate => "up to date",
        };
        f.write_str(text)
    }
}

/// Result of [`Stamper::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Ignore(IgnoreReason),
    Write(HeaderUpdate),
}

/// Applies the decision rules with a given timestamp format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamper {
    timestamp_format: String,
}

impl Default for Stamper {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl Stamper {
    #[must_use]
    pub fn new(timestamp_format: impl Into<String>) -> Self {
        Self {
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Fingerprint the body of `raw`, or say why there is nothing to do.
    ///
    /// This part needs no header parsing, so documents it rejects are never
    /// parsed at all.
    ///
    /// # Errors
    ///
    /// Returns [`IgnoreReason::EmptyBody`] for blank bodies and
    /// [`IgnoreReason::AlreadyRecorded`] when the fingerprint is already
    /// contained in `raw`.
    pub fn fingerprint_body(&self, raw: &str) -> Result<String, IgnoreReason> {
        let body = extract_body(raw).trim();
        if body.is_empty() {
            return Err(IgnoreReason::EmptyBody);
        }

        let hash = fingerprint(body);
        if raw.contains(hash.as_str()) {
            return Err(IgnoreReason::AlreadyRecorded);
        }
        Ok(hash)
    }

    /// Compute the header update for a fingerprinted body.
    ///
    /// Returns `None` when the existing fields are complete and already
    /// reflect either the modification time or the fingerprint.
    #[must_use]
    pub fn plan<Tz>(
        &self,
        existing: &HeaderFields,
        hash: &str,
        created_at: &DateTime<Tz>,
        modified_at: &DateTime<Tz>,
    ) -> Option<HeaderUpdate>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let created = format_timestamp(created_at, &self.timestamp_format);
        let modified = format_timestamp(modified_at, &self.timestamp_format);

        if existing.is_complete()
            && (existing.modified.as_deref() == Some(modified.as_str())
                || existing.hash.as_deref() == Some(hash))
        {
            return None;
        }

        Some(HeaderUpdate {
            created: existing.created.is_none().then_some(created),
            modified: Some(modified),
            hash: Some(hash.to_string()),
        })
    }

    /// Run the whole decision for one document.
    #[must_use]
    pub fn decide<Tz>(
        &self,
        raw: &str,
        created_at: &DateTime<Tz>,
        modified_at: &DateTime<Tz>,
        existing: &HeaderFields,
    ) -> Decision
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let hash = match self.fingerprint_body(raw) {
            Ok(hash) => hash,
            Err(reason) => return Decision::Ignore(reason),
        };
        match self.plan(existing, &hash, created_at, modified_at) {
            Some(update) => Decision::Write(update),
            None => Decision::Ignore(IgnoreReason::UpToDate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::{read_header, set_header_fields};
    use crate::header::FieldNames;
    use chrono::{Local, TimeZone};
    use proptest::prelude::*;

    fn local(d: u32, h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn fields_of(content: &str) -> HeaderFields {
        HeaderFields::from_mapping(&read_header(content).unwrap(), &FieldNames::default())
    }

    fn apply(content: &str, update: &HeaderUpdate) -> String {
        set_header_fields(content, &update.entries(&FieldNames::default())).unwrap()
    }

    #[test]
    fn first_run_fills_all_three_fields() {
        let stamper = Stamper::default();
        let decision = stamper.decide(
            "Hello world",
            &local(1, 9, 0),
            &local(2, 10, 30),
            &HeaderFields::default(),
        );
        assert_eq!(
            decision,
            Decision::Write(HeaderUpdate {
                created: Some("2024-03-01T09:00".to_string()),
                modified: Some("2024-03-02T10:30".to_string()),
                hash: Some(fingerprint("Hello world")),
            })
        );
    }

    #[test]
    fn blank_bodies_are_never_touched() {
        let stamper = Stamper::default();
        for raw in ["", "   \n\t", "---\ntitle: Only header\n---\n", "---\n---\n\n  \n"] {
            let decision = stamper.decide(raw, &local(1, 0, 0), &local(1, 0, 0), &fields_of(raw));
            assert_eq!(decision, Decision::Ignore(IgnoreReason::EmptyBody), "{raw:?}");
        }
    }

    #[test]
    fn fingerprint_ignores_surrounding_whitespace() {
        let stamper = Stamper::default();
        let a = stamper.fingerprint_body("\n\n  Body text \n").unwrap();
        let b = stamper.fingerprint_body("---\ntitle: x\n---\nBody text").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_anywhere_in_content_means_already_recorded() {
        let stamper = Stamper::default();
        let hash = fingerprint("Body");
        let raw = format!("---\nother: {hash}\n---\nBody");
        assert_eq!(
            stamper.fingerprint_body(&raw),
            Err(IgnoreReason::AlreadyRecorded)
        );
    }

    #[test]
    fn second_run_on_written_content_is_a_no_op() {
        let stamper = Stamper::default();
        let raw = "Hello world";
        let Decision::Write(update) =
            stamper.decide(raw, &local(1, 9, 0), &local(2, 10, 30), &HeaderFields::default())
        else {
            panic!("expected a write");
        };
        let written = apply(raw, &update);

        // the write itself bumps the modification time
        let again = stamper.decide(&written, &local(1, 9, 0), &local(2, 10, 31), &fields_of(&written));
        assert_eq!(again, Decision::Ignore(IgnoreReason::AlreadyRecorded));
    }

    #[test]
    fn edit_updates_modified_and_hash_but_keeps_created() {
        let stamper = Stamper::default();
        let old_hash = fingerprint("Hello world");
        let raw = format!(
            "---\ncreated: 2024-03-01T09:00\nmodified: 2024-03-02T10:30\nhash: {old_hash}\n---\nHello world!!"
        );
        let decision = stamper.decide(&raw, &local(1, 9, 0), &local(3, 8, 15), &fields_of(&raw));
        assert_eq!(
            decision,
            Decision::Write(HeaderUpdate {
                created: None,
                modified: Some("2024-03-03T08:15".to_string()),
                hash: Some(fingerprint("Hello world!!")),
            })
        );
    }

    #[test]
    fn matching_modified_time_short_circuits() {
        let stamper = Stamper::default();
        let raw = "---\ncreated: a\nmodified: 2024-03-03T08:15\nhash: stale\n---\nChanged body";
        let decision = stamper.decide(raw, &local(1, 0, 0), &local(3, 8, 15), &fields_of(raw));
        assert_eq!(decision, Decision::Ignore(IgnoreReason::UpToDate));
    }

    #[test]
    fn matching_hash_field_short_circuits() {
        let stamper = Stamper::default();
        let existing = HeaderFields {
            created: Some("a".to_string()),
            modified: Some("2020-01-01T00:00".to_string()),
            hash: Some("h".to_string()),
        };
        assert_eq!(
            stamper.plan(&existing, "h", &local(1, 0, 0), &local(9, 0, 0)),
            None
        );
    }

    #[test]
    fn partial_fields_always_write_modified_and_hash_together() {
        let stamper = Stamper::default();
        let existing = HeaderFields {
            created: Some("2023-12-31T23:59".to_string()),
            modified: None,
            hash: Some("stale".to_string()),
        };
        let update = stamper
            .plan(&existing, "fresh", &local(1, 0, 0), &local(2, 3, 4))
            .unwrap();
        assert_eq!(update.created, None);
        assert_eq!(update.modified.as_deref(), Some("2024-03-02T03:04"));
        assert_eq!(update.hash.as_deref(), Some("fresh"));
    }

    #[test]
    fn missing_created_is_filled_without_touching_the_guard() {
        let stamper = Stamper::default();
        let existing = HeaderFields {
            created: None,
            modified: Some("2024-03-02T03:04".to_string()),
            hash: Some("fresh".to_string()),
        };
        let update = stamper
            .plan(&existing, "fresh", &local(1, 0, 0), &local(2, 3, 4))
            .unwrap();
        assert_eq!(update.created.as_deref(), Some("2024-03-01T00:00"));
    }

    #[test]
    fn custom_timestamp_format_is_used() {
        let stamper = Stamper::new("%d.%m.%Y %H:%M");
        let update = stamper
            .plan(&HeaderFields::default(), "h", &local(1, 7, 5), &local(2, 8, 6))
            .unwrap();
        assert_eq!(update.created.as_deref(), Some("01.03.2024 07:05"));
        assert_eq!(update.modified.as_deref(), Some("02.03.2024 08:06"));
    }

    proptest! {
        #[test]
        fn stamping_is_idempotent(
            body in "[a-zA-Z0-9 .,!?#*\n]{0,200}",
            created_day in 1u32..28,
            modified_day in 1u32..28,
            bump in 0u32..59,
        ) {
            let stamper = Stamper::default();
            let created = local(created_day, 8, 0);
            let modified = local(modified_day, 9, 0);

            match stamper.decide(&body, &created, &modified, &fields_of(&body)) {
                Decision::Ignore(reason) => {
                    prop_assert!(body.trim().is_empty());
                    prop_assert_eq!(reason, IgnoreReason::EmptyBody);
                }
                Decision::Write(update) => {
                    let written = apply(&body, &update);
                    prop_assert_eq!(extract_body(&written).trim(), extract_body(&body).trim());

                    let later = local(modified_day, 9, bump);
                    let again = stamper.decide(&written, &created, &later, &fields_of(&written));
                    prop_assert_eq!(again, Decision::Ignore(IgnoreReason::AlreadyRecorded));
                }
            }
        }

        #[test]
        fn existing_created_is_never_replaced(
            created in "[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}",
            modified in proptest::option::of("[a-z0-9:-]{1,16}"),
            hash in proptest::option::of("[a-f0-9]{8,64}"),
            new_hash in "[a-f0-9]{64}",
            day in 1u32..28,
        ) {
            let stamper = Stamper::default();
            let existing = HeaderFields { created: Some(created), modified, hash };
            if let Some(update) = stamper.plan(&existing, &new_hash, &local(day, 0, 0), &local(day, 1, 0)) {
                prop_assert!(update.created.is_none());
                prop_assert_eq!(update.modified.is_some(), update.hash.is_some());
            }
        }
    }
}
