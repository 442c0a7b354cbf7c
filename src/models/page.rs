//! Fetch results handed to the change detector.

use std::borrow::Cow;

/// What the fetcher got back for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A full response
    Fetched(FetchedPage),
    /// `304 Not Modified` in answer to a conditional request
    NotModified,
}

/// A successful response body plus the headers the detector cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    pub last_modified: Option<String>,
}

impl FetchedPage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, value: impl Into<String>) -> Self {
        self.last_modified = Some(value.into());
        self
    }

    /// The `Last-Modified` value, if present and not blank.
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Body decoded for HTML parsing.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
