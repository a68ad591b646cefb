//! # mdstamp-core
//!
//! Core logic for keeping `created`, `modified` and `hash` fields in the
//! YAML frontmatter of markdown documents.
//!
//! Nothing in this crate touches documents on disk:
//! - [`fingerprint`]: stable digest of a document body
//! - [`frontmatter`]: header block splitting, parsing and field updates
//! - [`PathFilter`]: which documents are processed at all
//! - [`Stamper`]: the change decision engine
//! - [`Config`]: per-vault settings
//! - Error hierarchy ([`StampError`])
//!
//! The `hash` field holds a lowercase hex SHA-256 digest. Vaults stamped
//! with a SHA-1 based tool get each document rewritten once, and the two
//! tools should not run against the same vault.

pub mod config;
pub mod decision;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod frontmatter;
pub mod header;
pub mod timestamp;

pub use config::Config;
pub use decision::{Decision, IgnoreReason, Stamper};
pub use error::{Result, StampError};
pub use filter::PathFilter;
pub use fingerprint::fingerprint;
pub use header::{FieldNames, HeaderFields, HeaderUpdate};
