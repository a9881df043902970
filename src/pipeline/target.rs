//! Target column extraction and label encoding
//!
//! Group labels are mapped to a dense integer range `[0, num_classes)` in the
//! sorted order of the distinct labels, so encoded predictions can always be
//! turned back into names.

use anyhow::Context;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Mapping between target label strings and encoded class indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the observed labels. The class order is the sorted order of the
    /// distinct labels.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Class labels ordered by encoded index
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Encoded index of a label, `None` if it was not seen during fitting
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// Encode every label; fails on the first label unknown to the encoder
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> anyhow::Result<Vec<usize>> {
        labels
            .iter()
            .map(|label| {
                self.encode(label.as_ref())
                    .with_context(|| format!("Label '{}' was not seen during fitting", label.as_ref()))
            })
            .collect()
    }
}

/// Read the target column as optional strings, whatever its stored type.
///
/// Float targets print without a trailing `.0` and NaN counts as missing;
/// every other type goes through polars' string cast.
pub fn target_values(df: &DataFrame, target: &str) -> anyhow::Result<Vec<Option<String>>> {
    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let values = if col.dtype().is_float() {
        col.cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|n| !n.is_nan()).map(|n| n.to_string()))
            .collect()
    } else {
        col.cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    };

    Ok(values)
}
