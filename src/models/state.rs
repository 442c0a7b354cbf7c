//! Persisted per-target state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full persisted mapping, keyed by target name.
pub type StateMap = BTreeMap<String, TargetState>;

/// Last-known signal for one target.
///
/// Only one of `last_modified` / `hash` is the active comparison basis,
/// chosen by the target's current mode. A field written under a previous mode
/// is kept as-is and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Verbatim `Last-Modified` value from the last header-mode check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Fingerprint from the last fingerprint-mode check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Whether the most recent check failed
    #[serde(default)]
    pub last_error: bool,

    /// Fields written by other versions, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetState {
    /// Record from a header-mode check.
    pub fn with_last_modified(value: impl Into<String>) -> Self {
        Self {
            last_modified: Some(value.into()),
            ..Self::default()
        }
    }

    /// Record from a fingerprint-mode check.
    pub fn with_hash(value: impl Into<String>) -> Self {
        Self {
            hash: Some(value.into()),
            ..Self::default()
        }
    }
}
