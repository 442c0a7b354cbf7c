//! Pipeline entry points.
//!
//! - `run_checks`: Fetch every target, classify it and persist the new state

pub mod check;

pub use check::{RunOptions, RunReport, run_checks};
