//! Persistence of per-target state between runs.
//!
//! The state is loaded once before any target is checked and saved once after
//! every target has a result. Nothing else touches the backing file.
//!
//! ## File format
//!
//! ```text
//! {
//!     "xkcd": { "last_modified": "Wed, 21 Oct 2015 07:28:00 GMT", "last_error": false },
//!     "smbc": { "hash": "9f86d0...", "last_error": true }
//! }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StateMap;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load all records. A missing backing file is an empty mapping; an
    /// unreadable one is [`AppError::StateFileCorrupt`](crate::error::AppError).
    async fn load(&self) -> Result<StateMap>;

    /// Replace the stored mapping in a single write.
    async fn save(&self, states: &StateMap) -> Result<()>;
}
