// src/models/mod.rs

//! Domain models for the checker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod check;
mod config;
mod page;
mod state;
mod target;

// Re-export all public types
pub use check::{CheckError, CheckMode, CheckResult, CheckStatus};
pub use config::{CheckerConfig, Config, CriteriaConfig, TargetConfig};
pub use page::{FetchOutcome, FetchedPage};
pub use state::{StateMap, TargetState};
pub use target::{SelectionCriterion, Target};
