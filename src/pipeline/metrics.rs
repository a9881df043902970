//! Classification report: per-class precision, recall, F1 and support, plus
//! accuracy and macro / weighted averages.
//!
//! The JSON form is a flat mapping with one entry per class label, then
//! `"accuracy"`, `"macro avg"` and `"weighted avg"`. Metrics whose
//! denominator is zero are reported as 0.
//!
//! Every known class gets a row, but the macro average only counts classes
//! that occur in the truth or the predictions.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::PipelineError;

pub const ACCURACY_KEY: &str = "accuracy";
pub const MACRO_AVG_KEY: &str = "macro avg";
pub const WEIGHTED_AVG_KEY: &str = "weighted avg";

/// Metrics of one report row
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Rows in encoded-label order
    pub per_class: Vec<(String, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Compare encoded predictions with encoded truth. Every class in
    /// `class_names` gets a row, with zero support if it never occurs.
    pub fn from_predictions(
        y_true: &[usize],
        y_pred: &[usize],
        class_names: &[String],
    ) -> crate::error::Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::training(format!(
                "{} prediction(s) for {} validation row(s)",
                y_pred.len(),
                y_true.len()
            )));
        }

        let n_classes = class_names.len();
        if let Some(&label) = y_true.iter().chain(y_pred).find(|&&l| l >= n_classes) {
            return Err(PipelineError::training(format!(
                "label index {} outside {} known class(es)",
                label, n_classes
            )));
        }

        let mut true_positive = vec![0usize; n_classes];
        let mut predicted = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (&t, &p) in y_true.iter().zip(y_pred) {
            support[t] += 1;
            predicted[p] += 1;
            if t == p {
                true_positive[t] += 1;
            }
        }

        let per_class: Vec<(String, ClassMetrics)> = class_names
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let precision = ratio(true_positive[k], predicted[k]);
                let recall = ratio(true_positive[k], support[k]);
                (
                    name.clone(),
                    ClassMetrics {
                        precision,
                        recall,
                        f1_score: f1(precision, recall),
                        support: support[k],
                    },
                )
            })
            .collect();

        let total: usize = support.iter().sum();
        let correct: usize = true_positive.iter().sum();

        let seen: Vec<f64> = (0..n_classes)
            .map(|k| if support[k] + predicted[k] > 0 { 1.0 } else { 0.0 })
            .collect();
        let supports: Vec<f64> = support.iter().map(|&s| s as f64).collect();

        let macro_avg = average(&per_class, &seen, total);
        let weighted_avg = average(&per_class, &supports, total);

        Ok(Self {
            per_class,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        })
    }

    pub fn class(&self, name: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Report as a JSON object, the shape that gets persisted
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, metrics) in &self.per_class {
            map.insert(name.clone(), metrics_value(metrics));
        }
        map.insert(ACCURACY_KEY.to_string(), Value::from(self.accuracy));
        map.insert(MACRO_AVG_KEY.to_string(), metrics_value(&self.macro_avg));
        map.insert(WEIGHTED_AVG_KEY.to_string(), metrics_value(&self.weighted_avg));
        map
    }
}

fn metrics_value(metrics: &ClassMetrics) -> Value {
    serde_json::to_value(metrics).unwrap_or(Value::Null)
}

/// Average of per-class metrics under `weights`; support is the grand total
fn average(per_class: &[(String, ClassMetrics)], weights: &[f64], total: usize) -> ClassMetrics {
    let weight_sum: f64 = weights.iter().sum();
    let weighted = |metric: fn(&ClassMetrics) -> f64| {
        if weight_sum == 0.0 {
            0.0
        } else {
            per_class
                .iter()
                .zip(weights)
                .map(|((_, m), w)| metric(m) * w)
                .sum::<f64>()
                / weight_sum
        }
    };

    ClassMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1_score: weighted(|m| m.f1_score),
        support: total,
    }
}

/// Serializes in report order: classes, accuracy, macro avg, weighted avg
impl Serialize for ClassificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.per_class.len() + 3))?;
        for (name, metrics) in &self.per_class {
            map.serialize_entry(name, metrics)?;
        }
        map.serialize_entry(ACCURACY_KEY, &self.accuracy)?;
        map.serialize_entry(MACRO_AVG_KEY, &self.macro_avg)?;
        map.serialize_entry(WEIGHTED_AVG_KEY, &self.weighted_avg)?;
        map.end()
    }
}
