//! Persisted model results and the read operations over them

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::pipeline::metrics::{ACCURACY_KEY, WEIGHTED_AVG_KEY};
use crate::pipeline::train::TrainedEvaluation;
use crate::store::ResultStore;

/// A stored training outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub rf_result: Map<String, Value>,
    pub y_prob: Vec<Vec<f64>>,
    pub classes: Vec<String>,
}

/// A result not yet stored; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewModelResult {
    pub rf_result: Map<String, Value>,
    pub y_prob: Vec<Vec<f64>>,
    pub classes: Vec<String>,
}

impl NewModelResult {
    pub fn from_evaluation(evaluation: &TrainedEvaluation) -> Self {
        Self {
            rf_result: evaluation.report.to_json_map(),
            y_prob: evaluation.probabilities.clone(),
            classes: evaluation.classes.clone(),
        }
    }

    pub(crate) fn into_result(self, id: Uuid, created_at: DateTime<Utc>) -> ModelResult {
        ModelResult {
            id,
            created_at,
            rf_result: self.rf_result,
            y_prob: self.y_prob,
            classes: self.classes,
        }
    }
}

impl ModelResult {
    /// Report accuracy, or the weighted-average F1 when accuracy is missing
    /// or zero, or 0.
    pub fn accuracy(&self) -> f64 {
        let nonzero = |v: Option<f64>| v.filter(|x| *x != 0.0);

        nonzero(self.rf_result.get(ACCURACY_KEY).and_then(Value::as_f64))
            .or_else(|| {
                nonzero(
                    self.rf_result
                        .get(WEIGHTED_AVG_KEY)
                        .and_then(|avg| avg.get("f1-score"))
                        .and_then(Value::as_f64),
                )
            })
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            id: self.id.to_string(),
            created_at: iso_timestamp(&self.created_at),
            accuracy: round3(self.accuracy()),
            classes: self.classes.clone(),
        }
    }

    /// Full JSON view: `{id, created_at, rf_result, y_prob, classes}`
    pub fn to_detail_json(&self) -> Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "created_at": iso_timestamp(&self.created_at),
            "rf_result": self.rf_result,
            "y_prob": self.y_prob,
            "classes": self.classes,
        })
    }
}

/// One row of the results listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub id: String,
    pub created_at: String,
    pub accuracy: f64,
    pub classes: Vec<String>,
}

fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Store the outcome of a successful training run
pub fn persist(store: &dyn ResultStore, evaluation: &TrainedEvaluation) -> Result<Uuid> {
    let stored = store.insert_result(NewModelResult::from_evaluation(evaluation))?;
    info!("Stored model result {}", stored.id);
    Ok(stored.id)
}

/// Summaries of every stored result, newest first
pub fn list_results(store: &dyn ResultStore) -> Result<Vec<ResultSummary>> {
    Ok(store.list_results()?.iter().map(ModelResult::summary).collect())
}

pub fn get_result(store: &dyn ResultStore, id: &str) -> Result<ModelResult> {
    if Uuid::parse_str(id).is_err() {
        return Err(PipelineError::NotFound { id: id.to_string() });
    }
    store.get_result(id)
}
