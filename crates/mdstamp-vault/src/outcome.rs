//! Per-document results and run summaries.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use mdstamp_core::IgnoreReason;

/// What handling a single document ended in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The header was written (or would be, in a dry run).
    Ok,
    /// Nothing to do.
    Ignored { reason: IgnoreReason },
    /// The document could not be processed and was left as it was.
    Error { message: String },
}

impl Outcome {
    #[must_use]
    pub fn ignored(reason: IgnoreReason) -> Self {
        Self::Ignored { reason }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Ignored { reason } => write!(f, "ignored ({reason})"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// An outcome together with the document it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Counts of outcomes over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub written: usize,
    pub ignored: usize,
    pub errors: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Ok => self.written += 1,
            Outcome::Ignored { .. } => self.ignored += 1,
            Outcome::Error { .. } => self.errors += 1,
        }
    }

    /// Whether any recorded document ended in an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
