//! Pipeline module - load, clean, transform, train and evaluate

pub mod cleaner;
pub mod features;
pub mod gbdt;
pub mod loader;
pub mod metrics;
pub mod schema;
pub mod split;
pub mod target;
pub mod train;

pub use cleaner::{clean, clean_with_summary, drop_empty_rows, CleaningSummary};
pub use features::{ColumnTransformer, FeatureColumns, FeatureMatrix, OneHotEncoder, StandardScaler};
pub use gbdt::{GbdtConfig, GradientBoostedClassifier};
pub use loader::{load_records, load_records_json, records_to_json};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use schema::{canonicalize_headers, RecordCollection, TARGET_COLUMN};
pub use split::{train_validation_split, TrainValidationSplit};
pub use target::LabelEncoder;
pub use train::{preprocess_and_train, train, TrainedEvaluation, TrainingConfig, TrainingSummary};
