//! Backing store for record collections and persisted model results.
//!
//! Handles are passed explicitly to every operation that needs one. Both
//! traits require `Send + Sync` so a single store can serve concurrent
//! callers; each individual write is atomic.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Duration, Utc};
use polars::prelude::DataFrame;

use crate::error::Result;
use crate::pipeline::schema::RecordCollection;
use crate::results::{ModelResult, NewModelResult};

/// Storage of tabular record collections
pub trait RecordStore: Send + Sync {
    /// Every record of `collection`. A collection that was never written
    /// loads as an empty frame.
    fn load_collection(&self, collection: RecordCollection) -> Result<DataFrame>;

    /// Replace the whole collection with `records`, returning the row count
    fn replace_collection(&self, collection: RecordCollection, records: &DataFrame) -> Result<usize>;
}

/// Storage of model results. Results are immutable once inserted.
pub trait ResultStore: Send + Sync {
    /// Assign an id and a creation timestamp, then store the result
    fn insert_result(&self, result: NewModelResult) -> Result<ModelResult>;

    /// Every stored result, newest first
    fn list_results(&self) -> Result<Vec<ModelResult>>;

    /// The result with `id`, or `NotFound`
    fn get_result(&self, id: &str) -> Result<ModelResult>;
}

/// Creation timestamp for a new result, strictly after `latest`
pub(crate) fn next_created_at(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match latest {
        Some(latest) if now <= latest => latest + Duration::microseconds(1),
        _ => now,
    }
}

/// Sort newest first
pub(crate) fn sort_newest_first(results: &mut [ModelResult]) {
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
