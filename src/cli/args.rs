//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::gbdt::GbdtConfig;
use crate::pipeline::train::{TrainingConfig, DEFAULT_SEED, DEFAULT_TEST_SIZE};

/// MediSense - train and evaluate a dementia-group classifier on longitudinal MRI records
#[derive(Parser, Debug)]
#[command(name = "medisense")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store directory holding the record collections and model results
    #[arg(long, global = true, env = "MEDISENSE_STORE", default_value = "data/store")]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on the stored records and print the evaluation
    Train {
        #[command(flatten)]
        training: TrainingArgs,

        /// Print `{rf_result, y_prob, classes}` as JSON instead of tables
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Train, then persist the evaluation as a new model result
    Save {
        #[command(flatten)]
        training: TrainingArgs,
    },

    /// Train and print only the classification report
    Rf {
        #[command(flatten)]
        training: TrainingArgs,
    },

    /// Train and print only the validation class probabilities
    YProb {
        #[command(flatten)]
        training: TrainingArgs,
    },

    /// List stored model results, newest first
    Results {
        /// Print JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show one stored model result
    #[command(name = "result")]
    Show {
        /// Result identifier
        id: String,
    },

    /// Print the stored longitudinal records as JSON
    Data,

    /// Import `long.csv` and `cross.csv` into the store, replacing existing records
    Import {
        /// Directory containing the CSV exports
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Number of rows to use for schema inference.
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

/// Training knobs shared by every command that trains
#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainingArgs {
    /// Seed for the train/validation split and booster subsampling
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Fraction of records held out for validation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE, value_parser = validate_test_size)]
    pub test_size: f64,

    /// Number of boosting rounds
    #[arg(long, default_value = "100", value_parser = validate_positive_usize)]
    pub n_estimators: usize,

    /// Shrinkage applied to every tree
    #[arg(long, default_value = "0.3", value_parser = validate_learning_rate)]
    pub learning_rate: f64,

    /// Maximum depth of each tree
    #[arg(long, default_value = "6", value_parser = validate_positive_usize)]
    pub max_depth: usize,
}

impl TrainingArgs {
    pub fn to_config(&self) -> TrainingConfig {
        TrainingConfig {
            seed: self.seed,
            test_size: self.test_size,
            booster: GbdtConfig {
                n_estimators: self.n_estimators,
                learning_rate: self.learning_rate,
                max_depth: self.max_depth,
                ..GbdtConfig::default()
            },
        }
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse().map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test_size must be between 0.0 and 1.0 (exclusive), got {}", value))
    }
}

/// Validator for learning_rate parameter
fn validate_learning_rate(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("learning_rate must be in (0.0, 1.0], got {}", value))
    }
}

fn validate_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid positive integer", s))?;
    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
