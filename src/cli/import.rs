//! CSV import into the record store

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use log::info;
use polars::prelude::*;

use crate::pipeline::cleaner::drop_empty_rows;
use crate::pipeline::schema::{canonicalize_headers, RecordCollection};
use crate::store::RecordStore;
use crate::utils::{create_spinner, finish_with_success};

/// Rows imported into one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedCollection {
    pub collection: RecordCollection,
    pub source: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Read one CSV export, rename its headers to canonical columns and drop
/// rows with no value at all.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `collection` - Collection whose header mapping applies
/// * `infer_schema_length` - Rows used for schema inference, 0 for a full scan
pub fn read_source_csv(
    path: &Path,
    collection: RecordCollection,
    infer_schema_length: usize,
) -> Result<DataFrame> {
    if !path.is_file() {
        anyhow::bail!("CSV file not found: {}", path.display());
    }

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let mut df = LazyCsvReader::new(path)
        .with_infer_schema_length(schema_length)
        .with_has_header(true)
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    canonicalize_headers(&mut df, collection)
        .with_context(|| format!("Failed to rename columns of {}", path.display()))?;

    drop_empty_rows(&df).with_context(|| format!("Failed to clean {}", path.display()))
}

/// Import both CSV exports from `data_dir`, replacing each collection wholesale.
///
/// Both files are read before anything is written, so a missing or broken
/// file leaves the store untouched.
pub fn import_collections(
    store: &dyn RecordStore,
    data_dir: &Path,
    infer_schema_length: usize,
) -> Result<Vec<ImportedCollection>> {
    let mut frames = Vec::with_capacity(RecordCollection::ALL.len());
    for collection in RecordCollection::ALL {
        let source = data_dir.join(collection.source_file());
        let df = read_source_csv(&source, collection, infer_schema_length)?;
        frames.push((collection, source, df));
    }

    let mut imported = Vec::with_capacity(frames.len());
    for (collection, source, df) in frames {
        let rows = store
            .replace_collection(collection, &df)
            .with_context(|| format!("Failed to write collection {}", collection))?;
        info!("Imported {} row(s) into {}", rows, collection);
        imported.push(ImportedCollection {
            collection,
            source,
            rows,
            columns: df.width(),
        });
    }

    Ok(imported)
}

/// Run the import with terminal progress output
pub fn run_import(store: &dyn RecordStore, data_dir: &Path, infer_schema_length: usize) -> Result<()> {
    println!("\n {} Importing CSV exports", style("◆").cyan().bold());
    println!("   Source: {}", style(data_dir.display()).dim());
    println!();

    let spinner = create_spinner("Reading CSV files...");
    let imported = import_collections(store, data_dir, infer_schema_length)?;
    finish_with_success(&spinner, "Collections replaced");

    println!();
    for entry in &imported {
        println!(
            "   {} {} rows × {} columns → {}",
            style("✧").cyan(),
            style(entry.rows).yellow(),
            style(entry.columns).yellow(),
            style(entry.collection).bold()
        );
    }

    println!();
    println!(" {} Import complete!", style("✓").green().bold());

    Ok(())
}
