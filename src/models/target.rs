//! Monitored targets and their element selection rules.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::config::{CriteriaConfig, TargetConfig};

/// One configured page (or element within a page) to watch.
///
/// Built from [`TargetConfig`] at load time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Display name, also the key of the persisted state record
    pub name: String,

    /// Page URL
    pub url: String,

    /// Sub-element to fingerprint; `None` fingerprints the whole body
    pub criteria: Option<SelectionCriterion>,

    /// Never trust `Last-Modified`, always fingerprint
    pub override_last_modified: bool,
}

impl Target {
    /// Create a whole-page target.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            criteria: None,
            override_last_modified: false,
        }
    }

    /// Restrict fingerprinting to the first element matching `criteria`.
    pub fn with_criteria(mut self, criteria: SelectionCriterion) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Force fingerprint mode.
    pub fn with_override_last_modified(mut self, value: bool) -> Self {
        self.override_last_modified = value;
        self
    }

    /// Whether a `Last-Modified` header may be used for this target.
    pub fn header_mode_allowed(&self) -> bool {
        !self.override_last_modified
    }

    /// Validate a raw configuration entry.
    pub fn from_config(name: &str, raw: &TargetConfig) -> Result<Self> {
        let url = raw
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::config_invalid(name, "missing \"url\" attribute"))?;

        let parsed = Url::parse(url).map_err(|e| AppError::config_invalid(name, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::config_invalid(
                name,
                format!("unsupported URL scheme '{}'", parsed.scheme()),
            ));
        }

        let criteria = raw
            .criteria
            .as_ref()
            .map(|c| SelectionCriterion::from_config(c).map_err(|e| AppError::config_invalid(name, e)))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            criteria,
            override_last_modified: raw.override_last_modified,
        })
    }
}

/// Locates an element by tag name and exact attribute values.
///
/// Names are stored lowercased since HTML parsing lowercases element and
/// attribute names. At least one of `tag_name` or `attributes` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriterion {
    pub tag_name: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl SelectionCriterion {
    /// Match any element with this tag name.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag_name: Some(name.into().to_ascii_lowercase()),
            attributes: BTreeMap::new(),
        }
    }

    /// Additionally require `name="value"`.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    fn from_config(raw: &CriteriaConfig) -> std::result::Result<Self, String> {
        let tag_name = match raw.name.as_deref().map(str::trim) {
            Some("") => return Err("criteria \"name\" is empty".to_string()),
            Some(name) if !is_valid_name(name) => {
                return Err(format!("criteria \"name\" '{name}' is not a tag name"));
            }
            Some(name) => Some(name.to_ascii_lowercase()),
            None => None,
        };

        let mut attributes = BTreeMap::new();
        for (key, value) in &raw.attrs {
            let key = key.trim();
            if !is_valid_name(key) {
                return Err(format!("criteria attribute name '{key}' is invalid"));
            }
            attributes.insert(key.to_ascii_lowercase(), value.clone());
        }

        if tag_name.is_none() && attributes.is_empty() {
            return Err("criteria must set \"name\" or \"attrs\"".to_string());
        }

        Ok(Self {
            tag_name,
            attributes,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name.as_deref().unwrap_or("*"))?;
        for (key, value) in &self.attributes {
            write!(f, "[{key}={value:?}]")?;
        }
        Ok(())
    }
}
