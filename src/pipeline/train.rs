//! Preprocess-and-train: clean, split, transform, fit, evaluate

use std::time::{Duration, Instant};

use log::{info, warn};
use polars::prelude::*;
use serde::Serialize;

use super::cleaner::{clean_with_summary, CleaningSummary};
use super::features::{ColumnTransformer, FeatureColumns};
use super::gbdt::{GbdtConfig, GradientBoostedClassifier};
use super::loader::load_records;
use super::metrics::ClassificationReport;
use super::schema::{column_names, IDENTIFIER_COLUMNS, TARGET_COLUMN};
use super::split::train_validation_split;
use super::target::{target_values, LabelEncoder};
use crate::error::{PipelineError, Result};
use crate::store::RecordStore;

/// Seed used for the split and the booster unless overridden
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of rows held out for validation unless overridden
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_size: f64,
    pub booster: GbdtConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_size: DEFAULT_TEST_SIZE,
            booster: GbdtConfig::default(),
        }
    }
}

/// Bookkeeping from one training run, for display
#[derive(Debug, Clone, Default)]
pub struct TrainingSummary {
    pub cleaning: CleaningSummary,
    pub unlabelled_rows: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub feature_columns: Vec<String>,
    pub feature_names: Vec<String>,
    pub rounds: usize,
    pub fit_time: Duration,
}

/// Evaluation output of one training run.
///
/// Serializes as `{rf_result, y_prob, classes}`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainedEvaluation {
    #[serde(rename = "rf_result")]
    pub report: ClassificationReport,
    /// One probability vector per validation row, in validation order
    #[serde(rename = "y_prob")]
    pub probabilities: Vec<Vec<f64>>,
    /// Class labels ordered by encoded index
    pub classes: Vec<String>,
    /// Validation rows as indices into the cleaned, labelled record set
    #[serde(skip)]
    pub validation_rows: Vec<usize>,
    #[serde(skip)]
    pub summary: TrainingSummary,
}

/// Load every longitudinal record from `store` and train on them
pub fn preprocess_and_train(store: &dyn RecordStore, config: &TrainingConfig) -> Result<TrainedEvaluation> {
    let records = load_records(store)?;
    train(&records, config)
}

/// Train the classifier on `records` and evaluate it on a held-out split.
///
/// Fails with `MissingTargetColumn` before touching the data if there is no
/// target column; every later failure is `TrainingFailed`.
pub fn train(records: &DataFrame, config: &TrainingConfig) -> Result<TrainedEvaluation> {
    if !column_names(records).iter().any(|c| c == TARGET_COLUMN) {
        return Err(PipelineError::MissingTargetColumn {
            column: TARGET_COLUMN.to_string(),
        });
    }

    let start = Instant::now();
    let mut summary = TrainingSummary::default();

    let (cleaned, cleaning) = clean_with_summary(records).map_err(PipelineError::training)?;
    summary.cleaning = cleaning;

    let (labelled, labels) = labelled_rows(&cleaned)?;
    summary.unlabelled_rows = cleaned.height() - labelled.height();
    if summary.unlabelled_rows > 0 {
        warn!(
            "Skipping {} record(s) without a '{}' label",
            summary.unlabelled_rows, TARGET_COLUMN
        );
    }
    if labelled.height() == 0 {
        return Err(PipelineError::training("no labelled records available for training"));
    }

    let features = labelled.drop_many(IDENTIFIER_COLUMNS);
    let columns = FeatureColumns::select(&features);
    if columns.is_empty() {
        return Err(PipelineError::training("no feature columns available for training"));
    }
    summary.feature_columns = columns.scale.iter().chain(&columns.one_hot).cloned().collect();

    let encoder = LabelEncoder::fit(&labels);
    let encoded = encoder.encode_all(&labels).map_err(PipelineError::training)?;

    let split = train_validation_split(labelled.height(), config.test_size, config.seed)?;
    summary.train_rows = split.train.len();
    summary.validation_rows = split.validation.len();
    info!(
        "Split {} record(s) into {} training / {} validation",
        labelled.height(),
        split.train.len(),
        split.validation.len()
    );

    let y_train: Vec<usize> = split.train.iter().map(|&i| encoded[i]).collect();
    let y_val: Vec<usize> = split.validation.iter().map(|&i| encoded[i]).collect();

    let distinct_train = {
        let mut seen = y_train.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };
    if distinct_train < 2 {
        return Err(PipelineError::training(format!(
            "the training partition contains {} distinct class(es); at least two are required",
            distinct_train
        )));
    }

    let train_frame = take_rows(&features, &split.train)?;
    let val_frame = take_rows(&features, &split.validation)?;

    let transformer = ColumnTransformer::fit(&train_frame, &columns).map_err(PipelineError::training)?;
    summary.feature_names = transformer.feature_names();
    let x_train = transformer.transform(&train_frame).map_err(PipelineError::training)?;
    let x_val = transformer.transform(&val_frame).map_err(PipelineError::training)?;

    let model = GradientBoostedClassifier::fit(
        &x_train,
        &y_train,
        encoder.num_classes(),
        &config.booster,
        config.seed,
    )?;
    summary.rounds = model.n_rounds();

    let probabilities = model.predict_proba(&x_val)?;
    let predictions = model.predict(&x_val)?;
    let report = ClassificationReport::from_predictions(&y_val, &predictions, encoder.classes())?;

    summary.fit_time = start.elapsed();
    info!(
        "Validation accuracy {:.3} over {} row(s)",
        report.accuracy,
        y_val.len()
    );

    Ok(TrainedEvaluation {
        report,
        probabilities,
        classes: encoder.classes().to_vec(),
        validation_rows: split.validation,
        summary,
    })
}

/// Records that carry a target label, with the labels themselves
fn labelled_rows(df: &DataFrame) -> Result<(DataFrame, Vec<String>)> {
    let targets = target_values(df, TARGET_COLUMN).map_err(PipelineError::training)?;

    if targets.iter().all(Option::is_some) {
        return Ok((df.clone(), targets.into_iter().flatten().collect()));
    }

    let keep: Vec<bool> = targets.iter().map(Option::is_some).collect();
    let mask = BooleanChunked::from_slice("labelled".into(), &keep);
    let labelled = df.filter(&mask).map_err(PipelineError::training)?;

    Ok((labelled, targets.into_iter().flatten().collect()))
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let indices = IdxCa::from_vec("rows".into(), rows.iter().map(|&i| i as IdxSize).collect());
    df.take(&indices).map_err(PipelineError::training)
}
