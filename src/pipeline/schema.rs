//! Canonical column names for the longitudinal and cross-sectional records

use polars::prelude::*;

/// Diagnostic group label, the training target
pub const TARGET_COLUMN: &str = "group";

/// Subject and MRI session identifiers, never used as features
pub const IDENTIFIER_COLUMNS: [&str; 2] = ["subject_id", "mri_id"];

/// Storage-internal document identifier stripped on load
pub const STORAGE_ID_COLUMN: &str = "_id";

/// Numeric features standardized to zero mean / unit variance
pub const SCALE_COLUMNS: [&str; 8] = ["age", "educ", "ses", "mmse", "cdr", "etiv", "nwbv", "asf"];

/// Categorical features one-hot encoded
pub const ONE_HOT_COLUMNS: [&str; 2] = ["gender", "hand"];

/// Source CSV headers of the longitudinal dataset and their canonical names
const LONGITUDINAL_HEADERS: [(&str, &str); 15] = [
    ("Subject ID", "subject_id"),
    ("MRI ID", "mri_id"),
    ("Group", "group"),
    ("Visit", "visit"),
    ("MR Delay", "mr_delay"),
    ("M/F", "gender"),
    ("Hand", "hand"),
    ("Age", "age"),
    ("EDUC", "educ"),
    ("SES", "ses"),
    ("MMSE", "mmse"),
    ("CDR", "cdr"),
    ("eTIV", "etiv"),
    ("nWBV", "nwbv"),
    ("ASF", "asf"),
];

/// Source CSV headers of the cross-sectional dataset and their canonical names
const CROSS_SECTIONAL_HEADERS: [(&str, &str); 12] = [
    ("ID", "patient_id"),
    ("M/F", "gender"),
    ("Hand", "hand"),
    ("Age", "age"),
    ("Educ", "educ"),
    ("SES", "ses"),
    ("MMSE", "mmse"),
    ("CDR", "cdr"),
    ("eTIV", "etiv"),
    ("nWBV", "nwbv"),
    ("ASF", "asf"),
    ("Delay", "delay"),
];

/// Record collections held by the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordCollection {
    /// Multiple MRI visits per subject; the training data
    Longitudinal,
    /// One snapshot per patient; imported verbatim, not used for training
    CrossSectional,
}

impl RecordCollection {
    pub const ALL: [RecordCollection; 2] =
        [RecordCollection::Longitudinal, RecordCollection::CrossSectional];

    /// Collection name in the backing store
    pub fn name(&self) -> &'static str {
        match self {
            RecordCollection::Longitudinal => "long_data",
            RecordCollection::CrossSectional => "cross_data",
        }
    }

    /// File name of the CSV export this collection is imported from
    pub fn source_file(&self) -> &'static str {
        match self {
            RecordCollection::Longitudinal => "long.csv",
            RecordCollection::CrossSectional => "cross.csv",
        }
    }

    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordCollection::Longitudinal => &LONGITUDINAL_HEADERS,
            RecordCollection::CrossSectional => &CROSS_SECTIONAL_HEADERS,
        }
    }

    /// Canonical column name for a source header, if the header is known
    pub fn canonical_name(&self, header: &str) -> Option<&'static str> {
        self.headers()
            .iter()
            .find(|(source, _)| *source == header)
            .map(|(_, canonical)| *canonical)
    }
}

impl std::fmt::Display for RecordCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of the columns in `df`, as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Keep the canonical columns that are actually present, in canonical order
pub fn present_columns(df: &DataFrame, canonical: &[&str]) -> Vec<String> {
    let present = column_names(df);
    canonical
        .iter()
        .filter(|name| present.iter().any(|p| p == *name))
        .map(|name| name.to_string())
        .collect()
}

/// Rename known source headers of `collection` to their canonical names.
/// Unknown headers are kept as they are.
pub fn canonicalize_headers(df: &mut DataFrame, collection: RecordCollection) -> PolarsResult<()> {
    for header in column_names(df) {
        if let Some(canonical) = collection.canonical_name(&header) {
            if canonical != header {
                df.rename(&header, canonical.into())?;
            }
        }
    }
    Ok(())
}
