//! Observation storage and retention.
//!
//! An [`ObservationStore`] is an append-only table of
//! `(id, category, datetime, data)` rows. Two implementations exist:
//! [`MemoryStore`] for tests and ephemeral servers, and [`LogStore`], a
//! CRC32-framed append log that survives restarts.

pub mod log;
pub mod memory;
pub mod model;
pub mod retention;

use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use log::LogStore;
pub use memory::MemoryStore;
pub use model::Observation;
pub use retention::{RetentionError, RetentionPolicy, TruncateReport};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode observation: {0}")]
    Encode(#[from] postcard::Error),

    #[error("invalid observation data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored timestamp out of range: {0}")]
    Timestamp(i64),
}

/// Append-only table of observations.
///
/// Ids are assigned by the store, strictly increasing and never reused.
/// Mutating methods take `&mut self`; callers sharing a store wrap it in a
/// mutex, which also makes multi-step operations such as truncation atomic.
pub trait ObservationStore: Send {
    /// Persists a new observation and returns it with its assigned id.
    fn append(
        &mut self,
        category: &str,
        datetime: DateTime<Utc>,
        data: serde_json::Value,
    ) -> Result<Observation, StoreError>;

    fn get(&self, id: u64) -> Result<Option<Observation>, StoreError>;

    /// Observations of one category, most recent id first.
    fn list(&self, category: &str) -> Result<Vec<Observation>, StoreError>;

    /// Total number of observations across all categories.
    fn count(&self) -> Result<usize, StoreError>;

    /// Deletes one observation. Returns whether it existed.
    fn delete(&mut self, id: u64) -> Result<bool, StoreError>;

    /// Deletes every observation with `datetime < cutoff`. Returns the number removed.
    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
