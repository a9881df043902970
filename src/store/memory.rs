//! In-process store

use std::collections::HashMap;
use std::sync::RwLock;

use polars::prelude::DataFrame;
use uuid::Uuid;

use super::{next_created_at, sort_newest_first, RecordStore, ResultStore};
use crate::error::{PipelineError, Result};
use crate::pipeline::schema::RecordCollection;
use crate::results::{ModelResult, NewModelResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<RecordCollection, DataFrame>>,
    results: RwLock<Vec<ModelResult>>,
}

fn poisoned<T>(_: T) -> PipelineError {
    PipelineError::storage("store lock poisoned")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a longitudinal collection
    pub fn with_records(records: DataFrame) -> Self {
        Self {
            collections: RwLock::new(HashMap::from([(RecordCollection::Longitudinal, records)])),
            results: RwLock::default(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load_collection(&self, collection: RecordCollection) -> Result<DataFrame> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(&collection).cloned().unwrap_or_else(DataFrame::empty))
    }

    fn replace_collection(&self, collection: RecordCollection, records: &DataFrame) -> Result<usize> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections.insert(collection, records.clone());
        Ok(records.height())
    }
}

impl ResultStore for MemoryStore {
    fn insert_result(&self, result: NewModelResult) -> Result<ModelResult> {
        let mut results = self.results.write().map_err(poisoned)?;
        let latest = results.iter().map(|r| r.created_at).max();
        let stored = result.into_result(Uuid::new_v4(), next_created_at(latest));
        results.push(stored.clone());
        Ok(stored)
    }

    fn list_results(&self) -> Result<Vec<ModelResult>> {
        let mut results = self.results.read().map_err(poisoned)?.clone();
        sort_newest_first(&mut results);
        Ok(results)
    }

    fn get_result(&self, id: &str) -> Result<ModelResult> {
        let results = self.results.read().map_err(poisoned)?;
        results
            .iter()
            .find(|r| r.id.to_string() == id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound { id: id.to_string() })
    }
}
