//! Outcome of checking a single target.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A failure confined to one target. Never aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Transport error, timeout or non-success status
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Criteria configured but nothing in the document matched
    #[error("no element matching {criterion}")]
    ElementNotFound { criterion: String },
}

impl CheckError {
    pub fn fetch_failed(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Which comparison basis produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// `Last-Modified` string comparison
    LastModified,
    /// Content fingerprint comparison
    Fingerprint,
}

impl CheckMode {
    fn label(self) -> &'static str {
        match self {
            CheckMode::LastModified => "header",
            CheckMode::Fingerprint => "hash",
        }
    }
}

/// Classification of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Unmodified,
    /// Header mode saw a different `Last-Modified` value (the new one)
    ModifiedWithTimestamp(String),
    ModifiedByHash,
    /// No prior comparison basis was stored
    FirstRun,
    Error(CheckError),
}

impl CheckStatus {
    /// Parsed form of a `ModifiedWithTimestamp` value.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CheckStatus::ModifiedWithTimestamp(value) => DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(
            self,
            CheckStatus::ModifiedWithTimestamp(_) | CheckStatus::ModifiedByHash
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CheckStatus::Error(_))
    }
}

/// One target's result, tagged with its name for the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    /// Comparison basis used; `None` when the fetch failed
    pub mode: Option<CheckMode>,
    /// The stored record already had `last_error` set before this run
    pub previously_failed: bool,
}

impl CheckResult {
    /// Whether this result belongs in the report stream.
    ///
    /// With `only_changes`, unmodified and first-run results are dropped, as
    /// are errors the user was already told about on an earlier run.
    pub fn is_visible(&self, only_changes: bool) -> bool {
        if !only_changes {
            return true;
        }
        match &self.status {
            CheckStatus::ModifiedWithTimestamp(_) | CheckStatus::ModifiedByHash => true,
            CheckStatus::Error(_) => !self.previously_failed,
            CheckStatus::Unmodified | CheckStatus::FirstRun => false,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let via = self.mode.map(CheckMode::label).unwrap_or("header");
        match &self.status {
            CheckStatus::Unmodified => write!(f, "{} unmodified (checked via {via})", self.name),
            CheckStatus::FirstRun => {
                write!(f, "* {} first check (via {via})", self.name.to_uppercase())
            }
            CheckStatus::ModifiedByHash => write!(
                f,
                "* {} modified (checked via hash)",
                self.name.to_uppercase()
            ),
            CheckStatus::ModifiedWithTimestamp(raw) => {
                let name = self.name.to_uppercase();
                match self.status.timestamp() {
                    Some(ts) => write!(f, "* {name} modified {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
                    None => write!(f, "* {name} modified {raw}"),
                }
            }
            CheckStatus::Error(error) => write!(f, "{} failed: {error}", self.name),
        }
    }
}
