//! MediSense: dementia-group classification pipeline
//!
//! Loads longitudinal MRI records from a backing store, cleans them,
//! trains a gradient-boosted classifier on a seeded split and persists
//! the evaluation so it can be listed and fetched later.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod store;
pub mod utils;

pub use error::{PipelineError, Result};
