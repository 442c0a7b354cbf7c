//! Service layer for the checker.
//!
//! This module contains the decision logic for:
//! - Content fingerprinting (`fingerprint`)
//! - Element lookup in fetched HTML (`HtmlLocator`)
//! - Per-target change classification (`ChangeDetector`)

mod detector;
mod fingerprint;
mod locator;

pub use detector::{ChangeDetector, Decision};
pub use fingerprint::fingerprint;
pub use locator::{ElementLocator, HtmlLocator};
