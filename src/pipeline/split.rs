//! Seeded train/validation split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValidationSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Shuffle `0..n_rows` with a seeded RNG and hold out `ceil(test_size * n_rows)`
/// rows for validation. The first rows of the permutation form the validation
/// partition, the rest the training partition.
pub fn train_validation_split(n_rows: usize, test_size: f64, seed: u64) -> Result<TrainValidationSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::training(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_validation = (test_size * n_rows as f64).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_validation);

    if n_validation == 0 || n_train == 0 {
        return Err(PipelineError::training(format!(
            "With n_samples={} and test_size={}, the resulting train set would be empty",
            n_rows, test_size
        )));
    }

    let mut permutation: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_validation);

    Ok(TrainValidationSplit {
        train,
        validation: permutation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_validation_split(5, 0.2, 42).unwrap();
        assert_eq!(split.validation.len(), 1);
        assert_eq!(split.train.len(), 4);

        let split = train_validation_split(373, 0.2, 42).unwrap();
        assert_eq!(split.validation.len(), 75);
        assert_eq!(split.train.len(), 298);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_validation_split(50, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.validation).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let a = train_validation_split(100, 0.2, 42).unwrap();
        let b = train_validation_split(100, 0.2, 42).unwrap();
        assert_eq!(a, b);

        let c = train_validation_split(100, 0.2, 43).unwrap();
        assert_ne!(a.validation, c.validation);
    }

    #[test]
    fn test_split_rejects_tiny_inputs() {
        assert!(train_validation_split(1, 0.2, 42).is_err());
        assert!(train_validation_split(0, 0.2, 42).is_err());
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        assert!(train_validation_split(10, 0.0, 42).is_err());
        assert!(train_validation_split(10, 1.0, 42).is_err());
    }
}
