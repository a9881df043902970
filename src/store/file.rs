//! Directory-backed store.
//!
//! Layout under the root directory:
//!
//! ```text
//! long_data.parquet
//! cross_data.parquet
//! model_results/<created_at micros>.json
//! ```
//!
//! Every write goes to a temporary file in the same directory and is then
//! renamed over the target, so readers never observe a partial file.
//!
//! Each result is its own document, named after its creation timestamp in
//! microseconds. Inserts claim the name with a no-clobber rename, so
//! independent handles and processes never overwrite each other and no two
//! results share a timestamp.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::{debug, warn};
use polars::prelude::*;
use tempfile::NamedTempFile;
use uuid::Uuid;

use super::{next_created_at, sort_newest_first, RecordStore, ResultStore};
use crate::error::{PipelineError, Result};
use crate::pipeline::schema::RecordCollection;
use crate::results::{ModelResult, NewModelResult};

const RESULTS_DIR: &str = "model_results";

/// Attempts to claim a free timestamp before giving up on an insert
const MAX_CLAIM_ATTEMPTS: usize = 1_000;

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open an existing store directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PipelineError::storage(format!(
                "store directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Open the store directory, creating it first if needed
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            PipelineError::storage(format!("cannot create '{}': {}", root.display(), e))
        })?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: RecordCollection) -> PathBuf {
        self.root.join(format!("{}.parquet", collection.name()))
    }

    fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(PipelineError::storage(format!(
                "store directory '{}' is no longer reachable",
                self.root.display()
            )))
        }
    }

    /// Write through a temp file in the store root, then rename into place
    fn write_atomically<F>(&self, target: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(PipelineError::storage)?;
        write(tmp.as_file_mut())?;
        tmp.as_file_mut().sync_all().map_err(PipelineError::storage)?;
        tmp.persist(target).map_err(|e| {
            PipelineError::storage(format!("cannot write '{}': {}", target.display(), e))
        })?;
        Ok(())
    }

    /// Timestamp encoded in a result document's file name
    fn document_timestamp(path: &Path) -> Option<DateTime<Utc>> {
        if path.extension()? != "json" {
            return None;
        }
        let micros: i64 = path.file_stem()?.to_str()?.parse().ok()?;
        DateTime::from_timestamp(
            micros.div_euclid(1_000_000),
            (micros.rem_euclid(1_000_000) * 1_000) as u32,
        )
    }

    /// Result documents paired with their timestamps, skipping temp files
    fn result_documents(&self) -> Result<Vec<(DateTime<Utc>, PathBuf)>> {
        self.ensure_reachable()?;
        let dir = self.results_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PipelineError::storage(format!(
                    "cannot read '{}': {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry.map_err(PipelineError::storage)?.path();
            if let Some(created_at) = Self::document_timestamp(&path) {
                documents.push((created_at, path));
            }
        }
        Ok(documents)
    }

    fn read_result(path: &Path) -> Result<ModelResult> {
        let file = File::open(path).map_err(|e| {
            PipelineError::storage(format!("cannot open '{}': {}", path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::storage(format!("cannot read '{}': {}", path.display(), e))
        })
    }

    fn read_results(&self) -> Result<Vec<ModelResult>> {
        self.result_documents()?
            .iter()
            .map(|(_, path)| Self::read_result(path))
            .collect()
    }

    fn document_path(&self, created_at: &DateTime<Utc>) -> PathBuf {
        self.results_dir()
            .join(format!("{:020}.json", created_at.timestamp_micros()))
    }
}

impl RecordStore for FileStore {
    fn load_collection(&self, collection: RecordCollection) -> Result<DataFrame> {
        self.ensure_reachable()?;
        let path = self.collection_path(collection);
        if !path.exists() {
            debug!("Collection {} has not been imported yet", collection);
            return Ok(DataFrame::empty());
        }

        let file = File::open(&path).map_err(PipelineError::storage)?;
        ParquetReader::new(file).finish().map_err(|e| {
            PipelineError::storage(format!("cannot read '{}': {}", path.display(), e))
        })
    }

    fn replace_collection(&self, collection: RecordCollection, records: &DataFrame) -> Result<usize> {
        self.ensure_reachable()?;
        let mut records = records.clone();
        self.write_atomically(&self.collection_path(collection), |file| {
            ParquetWriter::new(file)
                .finish(&mut records)
                .map(|_| ())
                .map_err(PipelineError::storage)
        })?;
        debug!("Wrote {} record(s) to {}", records.height(), collection);
        Ok(records.height())
    }
}

impl ResultStore for FileStore {
    fn insert_result(&self, result: NewModelResult) -> Result<ModelResult> {
        self.ensure_reachable()?;
        let dir = self.results_dir();
        std::fs::create_dir_all(&dir).map_err(|e| {
            PipelineError::storage(format!("cannot create '{}': {}", dir.display(), e))
        })?;

        let latest = self.result_documents()?.into_iter().map(|(at, _)| at).max();
        // Document names carry microseconds, so the stored timestamp does too
        let mut created_at = next_created_at(latest).trunc_subsecs(6);
        let id = Uuid::new_v4();

        let mut tmp = NamedTempFile::new_in(&dir).map_err(PipelineError::storage)?;
        // The document is rewritten with the claimed timestamp on each attempt
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let stored = result.clone().into_result(id, created_at);
            let file = tmp.as_file_mut();
            file.set_len(0).map_err(PipelineError::storage)?;
            file.rewind().map_err(PipelineError::storage)?;
            serde_json::to_writer_pretty(&mut *file, &stored).map_err(PipelineError::storage)?;
            file.flush().map_err(PipelineError::storage)?;
            file.sync_all().map_err(PipelineError::storage)?;

            match tmp.persist_noclobber(self.document_path(&created_at)) {
                Ok(_) => {
                    debug!("Stored result {} at {}", id, created_at);
                    return Ok(stored);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    tmp = e.file;
                    created_at = created_at + Duration::microseconds(1);
                }
                Err(e) => {
                    return Err(PipelineError::storage(format!(
                        "cannot write result {}: {}",
                        id, e.error
                    )))
                }
            }
        }

        warn!("No free timestamp after {} attempts", MAX_CLAIM_ATTEMPTS);
        Err(PipelineError::storage("too many concurrent result writes"))
    }

    fn list_results(&self) -> Result<Vec<ModelResult>> {
        let mut results = self.read_results()?;
        sort_newest_first(&mut results);
        Ok(results)
    }

    fn get_result(&self, id: &str) -> Result<ModelResult> {
        for (_, path) in self.result_documents()? {
            let result = Self::read_result(&path)?;
            if result.id.to_string() == id {
                return Ok(result);
            }
        }
        Err(PipelineError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn new_result() -> NewModelResult {
        let rf_result: Map<String, serde_json::Value> =
            json!({"accuracy": 0.75}).as_object().cloned().unwrap();
        NewModelResult {
            rf_result,
            y_prob: vec![vec![0.1, 0.2, 0.7]],
            classes: vec!["Converted".into(), "Demented".into(), "Nondemented".into()],
        }
    }

    #[test]
    fn test_open_missing_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = FileStore::open(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PipelineError::StorageUnavailable(_)));
    }

    #[test]
    fn test_create_makes_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::create(dir.path().join("nested/store")).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_collection_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let df = df! {
            "group" => ["Demented", "Nondemented"],
            "age" => [Some(81.0f64), None],
        }
        .unwrap();

        assert_eq!(store.replace_collection(RecordCollection::Longitudinal, &df).unwrap(), 2);
        assert!(store.collection_path(RecordCollection::Longitudinal).exists());

        let loaded = store.load_collection(RecordCollection::Longitudinal).unwrap();
        assert!(loaded.equals_missing(&df));
    }

    #[test]
    fn test_unimported_collection_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.load_collection(RecordCollection::CrossSectional).unwrap().height(), 0);
    }

    #[test]
    fn test_results_persist_across_handles() {
        let dir = TempDir::new().unwrap();
        let stored = FileStore::open(dir.path()).unwrap().insert_result(new_result()).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        let fetched = reopened.get_result(&stored.id.to_string()).unwrap();
        assert_eq!(fetched, stored);
    }

    #[test]
    fn test_independent_handles_keep_every_result() {
        let dir = TempDir::new().unwrap();
        let first = FileStore::open(dir.path()).unwrap();
        let second = FileStore::open(dir.path()).unwrap();

        let a = first.insert_result(new_result()).unwrap();
        let b = second.insert_result(new_result()).unwrap();
        let c = first.insert_result(new_result()).unwrap();

        let listed = second.list_results().unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
        assert!(b.created_at > a.created_at);
        assert!(c.created_at > b.created_at);
    }

    #[test]
    fn test_stray_files_in_results_dir_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let stored = store.insert_result(new_result()).unwrap();

        std::fs::write(dir.path().join(RESULTS_DIR).join(".tmpXYZ"), b"partial").unwrap();
        std::fs::write(dir.path().join(RESULTS_DIR).join("notes.json"), b"{}").unwrap();

        let listed = store.list_results().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], stored);
    }

    #[test]
    fn test_removed_root_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let store = FileStore::create(&root).unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let err = store.list_results().unwrap_err();
        assert!(matches!(err, PipelineError::StorageUnavailable(_)));
    }
}
