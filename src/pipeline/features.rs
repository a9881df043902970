//! Column transform: standard scaling for numeric columns, one-hot encoding
//! for categorical columns.
//!
//! Both transforms are fit on the training partition only and then applied
//! to any partition. Columns outside the two groups are dropped.

use polars::prelude::*;
use serde::Serialize;

use super::schema::{present_columns, ONE_HOT_COLUMNS, SCALE_COLUMNS};

/// Feature columns present in a record set, split by transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureColumns {
    pub scale: Vec<String>,
    pub one_hot: Vec<String>,
}

impl FeatureColumns {
    /// Intersect the canonical feature lists with the columns of `df`
    pub fn select(df: &DataFrame) -> Self {
        Self {
            scale: present_columns(df, &SCALE_COLUMNS),
            one_hot: present_columns(df, &ONE_HOT_COLUMNS),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_empty() && self.one_hot.is_empty()
    }
}

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_features: usize,
}

impl FeatureMatrix {
    pub fn new(data: Vec<f64>, n_rows: usize, n_features: usize) -> PolarsResult<Self> {
        if data.len() != n_rows * n_features {
            return Err(PolarsError::ShapeMismatch(
                format!(
                    "{} value(s) cannot fill a {} x {} matrix",
                    data.len(),
                    n_rows,
                    n_features
                )
                .into(),
            ));
        }
        Ok(Self {
            data,
            n_rows,
            n_features,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_features..(i + 1) * self.n_features]
    }

    #[inline]
    pub fn get(&self, row: usize, feature: usize) -> f64 {
        self.data[row * self.n_features + feature]
    }
}

/// Zero-mean / unit-variance scaling fitted per column.
///
/// Uses the population standard deviation. A constant column scales by 1.
/// NaN cells are ignored while fitting and stay NaN after transform.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(df: &DataFrame, columns: &[String]) -> PolarsResult<Self> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());

        for name in columns {
            let values = numeric_values(df, name)?;
            let observed: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();

            if observed.is_empty() {
                means.push(0.0);
                scales.push(1.0);
                continue;
            }

            let n = observed.len() as f64;
            let mean = observed.iter().sum::<f64>() / n;
            let variance = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            means.push(mean);
            scales.push(if std < 10.0 * f64::EPSILON * mean.abs().max(1.0) { 1.0 } else { std });
        }

        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scaled values, one Vec per column
    fn transform_columns(&self, df: &DataFrame) -> PolarsResult<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values = numeric_values(df, name)?;
                Ok(values
                    .into_iter()
                    .map(|v| (v - self.means[i]) / self.scales[i])
                    .collect())
            })
            .collect()
    }
}

/// One-hot encoding with vocabularies learned from the fitting data.
///
/// Categories unseen during fitting, and missing cells, encode as all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(df: &DataFrame, columns: &[String]) -> PolarsResult<Self> {
        let mut categories = Vec::with_capacity(columns.len());

        for name in columns {
            let mut vocabulary: Vec<String> = categorical_values(df, name)?.into_iter().flatten().collect();
            vocabulary.sort();
            vocabulary.dedup();
            categories.push(vocabulary);
        }

        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sorted categories learned for column `column`
    pub fn categories(&self, column: usize) -> &[String] {
        &self.categories[column]
    }

    /// Number of output features
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Encoded indicator columns, in column then category order
    fn transform_columns(&self, df: &DataFrame) -> PolarsResult<Vec<Vec<f64>>> {
        let mut out = Vec::with_capacity(self.width());

        for (name, vocabulary) in self.columns.iter().zip(&self.categories) {
            let values = categorical_values(df, name)?;
            for category in vocabulary {
                out.push(
                    values
                        .iter()
                        .map(|v| if v.as_deref() == Some(category.as_str()) { 1.0 } else { 0.0 })
                        .collect(),
                );
            }
        }

        Ok(out)
    }
}

/// Scaler and encoder applied side by side; output columns are the scaled
/// numeric columns followed by the one-hot indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTransformer {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl ColumnTransformer {
    pub fn fit(df: &DataFrame, columns: &FeatureColumns) -> PolarsResult<Self> {
        Ok(Self {
            scaler: StandardScaler::fit(df, &columns.scale)?,
            encoder: OneHotEncoder::fit(df, &columns.one_hot)?,
        })
    }

    /// Output feature names, e.g. `age`, `gender_F`, `gender_M`
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scaler.columns().to_vec();
        for (i, column) in self.encoder.columns().iter().enumerate() {
            for category in self.encoder.categories(i) {
                names.push(format!("{}_{}", column, category));
            }
        }
        names
    }

    pub fn transform(&self, df: &DataFrame) -> PolarsResult<FeatureMatrix> {
        let mut columns = self.scaler.transform_columns(df)?;
        columns.extend(self.encoder.transform_columns(df)?);

        let n_rows = df.height();
        let n_features = columns.len();
        let mut data = Vec::with_capacity(n_rows * n_features);
        for row in 0..n_rows {
            for column in &columns {
                data.push(column[row]);
            }
        }

        FeatureMatrix::new(data, n_rows, n_features)
    }
}

/// Column values as f64 with null (and unparseable) cells as NaN
fn numeric_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let floats = df.column(name)?.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Column values as category strings
fn categorical_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let strings = df.column(name)?.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df! {
            "age" => [70.0f64, 80.0, 90.0, 60.0],
            "educ" => [12i64, 12, 12, 12],
            "gender" => ["M", "F", "F", "M"],
            "hand" => ["R", "R", "R", "R"],
            "visit" => [1i32, 2, 1, 3],
        }
        .unwrap()
    }

    #[test]
    fn test_select_ignores_absent_columns() {
        let columns = FeatureColumns::select(&sample());
        assert_eq!(columns.scale, vec!["age", "educ"]);
        assert_eq!(columns.one_hot, vec!["gender", "hand"]);
    }

    #[test]
    fn test_scaler_zero_mean_unit_variance() {
        let df = sample();
        let scaler = StandardScaler::fit(&df, &["age".to_string()]).unwrap();
        assert!((scaler.means[0] - 75.0).abs() < 1e-12);
        assert!((scaler.scales[0] - 125.0f64.sqrt()).abs() < 1e-12);

        let scaled = &scaler.transform_columns(&df).unwrap()[0];
        let mean: f64 = scaled.iter().sum::<f64>() / 4.0;
        let var: f64 = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_constant_column_scales_by_one() {
        let df = sample();
        let scaler = StandardScaler::fit(&df, &["educ".to_string()]).unwrap();
        assert_eq!(scaler.scales[0], 1.0);
        let scaled = &scaler.transform_columns(&df).unwrap()[0];
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_scaler_passes_nan_through() {
        let df = df! { "ses" => [Some(1.0f64), None, Some(3.0)] }.unwrap();
        let scaler = StandardScaler::fit(&df, &["ses".to_string()]).unwrap();
        assert_eq!(scaler.means[0], 2.0);
        let scaled = &scaler.transform_columns(&df).unwrap()[0];
        assert!(scaled[1].is_nan());
        assert_eq!(scaled[0], -1.0);
    }

    #[test]
    fn test_one_hot_ignores_unknown_categories() {
        let train = df! { "hand" => ["R", "R", "L"] }.unwrap();
        let encoder = OneHotEncoder::fit(&train, &["hand".to_string()]).unwrap();
        assert_eq!(encoder.categories(0), &["L", "R"]);

        let unseen = df! { "hand" => [Some("A"), Some("R"), None] }.unwrap();
        let encoded = encoder.transform_columns(&unseen).unwrap();
        // columns: hand_L, hand_R
        assert_eq!(encoded[0], vec![0.0, 0.0, 0.0]);
        assert_eq!(encoded[1], vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_transformer_layout_and_names() {
        let df = sample();
        let columns = FeatureColumns::select(&df);
        let transformer = ColumnTransformer::fit(&df, &columns).unwrap();

        assert_eq!(
            transformer.feature_names(),
            vec!["age", "educ", "gender_F", "gender_M", "hand_R"]
        );

        let matrix = transformer.transform(&df).unwrap();
        assert_eq!(matrix.n_rows(), 4);
        assert_eq!(matrix.n_features(), 5);
        // second row is a woman, right-handed
        assert_eq!(&matrix.row(1)[2..], &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_matrix_rejects_wrong_shape() {
        assert!(FeatureMatrix::new(vec![0.0; 5], 2, 3).is_err());
        let matrix = FeatureMatrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(matrix.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(matrix.get(0, 2), 3.0);
    }
}
