//! Report module - terminal tables for training runs and stored results

pub mod summary;

pub use summary::*;
