//! Multi-class gradient-boosted decision trees
//!
//! Softmax objective with second-order (gradient + hessian) leaf weights and
//! L2 regularization. Each round fits one regression tree per class against
//! the current softmax probabilities; the per-class trees of a round are
//! independent and are built in parallel, as is the split search over
//! features. Missing feature values (NaN) follow a default direction learned
//! at each split.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use super::features::FeatureMatrix;
use crate::error::{PipelineError, Result};

/// Splits must improve the regularized loss by more than this
const MIN_SPLIT_GAIN: f64 = 1e-6;

/// Floor for the per-row hessian
const MIN_HESSIAN: f64 = 1e-16;

/// Booster hyper-parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GbdtConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum hessian sum in a child for a split to be accepted
    pub min_child_weight: f64,
    /// Minimum loss reduction required to split
    pub gamma: f64,
    /// Fraction of rows sampled per round
    pub subsample: f64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            gamma: 0.0,
            subsample: 1.0,
        }
    }
}

impl GbdtConfig {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::training("n_estimators must be > 0"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PipelineError::training("learning_rate must be > 0"));
        }
        if self.reg_lambda < 0.0 || self.min_child_weight < 0.0 || self.gamma < 0.0 {
            return Err(PipelineError::training(
                "reg_lambda, min_child_weight and gamma must be non-negative",
            ));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(PipelineError::training("subsample must be in (0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        default_left: bool,
        left: usize,
        right: usize,
    },
    Leaf {
        weight: f64,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { weight } => return *weight,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    idx = if goes_left(row[*feature], *threshold, *default_left) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[inline]
fn goes_left(value: f64, threshold: f64, default_left: bool) -> bool {
    if value.is_finite() {
        value <= threshold
    } else {
        default_left
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    default_left: bool,
    gain: f64,
}

/// Structure score of a node, G^2 / (H + lambda)
#[inline]
fn score(grad: f64, hess: f64, lambda: f64) -> f64 {
    grad * grad / (hess + lambda)
}

struct TreeBuilder<'a> {
    x: &'a FeatureMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    config: &'a GbdtConfig,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(x: &'a FeatureMatrix, grad: &'a [f64], hess: &'a [f64], config: &'a GbdtConfig) -> Self {
        Self {
            x,
            grad,
            hess,
            config,
            nodes: Vec::new(),
        }
    }

    fn build(mut self, rows: &[usize]) -> Tree {
        self.grow(rows, 0);
        Tree { nodes: self.nodes }
    }

    fn leaf_weight(&self, grad: f64, hess: f64) -> f64 {
        -grad / (hess + self.config.reg_lambda) * self.config.learning_rate
    }

    fn grow(&mut self, rows: &[usize], depth: usize) -> usize {
        let grad: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let hess: f64 = rows.iter().map(|&r| self.hess[r]).sum();

        let split = if depth < self.config.max_depth && rows.len() >= 2 {
            self.best_split(rows, grad, hess)
        } else {
            None
        };

        let Some(split) = split else {
            let idx = self.nodes.len();
            self.nodes.push(Node::Leaf {
                weight: self.leaf_weight(grad, hess),
            });
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows.iter().partition(|&&r| {
            goes_left(self.x.get(r, split.feature), split.threshold, split.default_left)
        });

        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { weight: 0.0 }); // placeholder

        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);

        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            default_left: split.default_left,
            left,
            right,
        };

        node_idx
    }

    /// Best split over all features; ties go to the lowest feature index
    fn best_split(&self, rows: &[usize], grad: f64, hess: f64) -> Option<SplitCandidate> {
        let candidates: Vec<SplitCandidate> = (0..self.x.n_features())
            .into_par_iter()
            .filter_map(|feature| self.best_split_for_feature(feature, rows, grad, hess))
            .collect();

        candidates
            .into_iter()
            .fold(None, |best: Option<SplitCandidate>, c| match best {
                Some(b) if b.gain >= c.gain => Some(b),
                _ => Some(c),
            })
    }

    fn best_split_for_feature(
        &self,
        feature: usize,
        rows: &[usize],
        grad: f64,
        hess: f64,
    ) -> Option<SplitCandidate> {
        let lambda = self.config.reg_lambda;
        let min_child = self.config.min_child_weight;

        let mut present: Vec<(f64, f64, f64)> = Vec::with_capacity(rows.len());
        let mut missing_grad = 0.0;
        let mut missing_hess = 0.0;
        for &r in rows {
            let v = self.x.get(r, feature);
            if v.is_finite() {
                present.push((v, self.grad[r], self.hess[r]));
            } else {
                missing_grad += self.grad[r];
                missing_hess += self.hess[r];
            }
        }

        if present.len() < 2 {
            return None;
        }
        present.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let parent = score(grad, hess, lambda);
        let mut best: Option<SplitCandidate> = None;
        let mut left_grad = 0.0;
        let mut left_hess = 0.0;

        for i in 0..present.len() - 1 {
            left_grad += present[i].1;
            left_hess += present[i].2;

            // No threshold fits between equal values
            if present[i].0 == present[i + 1].0 {
                continue;
            }

            for default_left in [true, false] {
                let (gl, hl) = if default_left {
                    (left_grad + missing_grad, left_hess + missing_hess)
                } else {
                    (left_grad, left_hess)
                };
                let (gr, hr) = (grad - gl, hess - hl);

                if hl < min_child || hr < min_child {
                    continue;
                }

                let gain =
                    0.5 * (score(gl, hl, lambda) + score(gr, hr, lambda) - parent) - self.config.gamma;

                if gain > MIN_SPLIT_GAIN && best.map_or(true, |b| gain > b.gain) {
                    let (lo, hi) = (present[i].0, present[i + 1].0);
                    best = Some(SplitCandidate {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        default_left,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Numerically stable softmax
pub fn softmax(raw: &[f64]) -> Vec<f64> {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Index of the largest value; the first one wins ties
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}

/// A fitted multi-class booster
#[derive(Debug, Clone)]
pub struct GradientBoostedClassifier {
    /// One tree per class for every boosting round
    rounds: Vec<Vec<Tree>>,
    n_classes: usize,
    n_features: usize,
}

impl GradientBoostedClassifier {
    /// Fit on a feature matrix and labels in `0..n_classes`.
    ///
    /// `seed` drives row subsampling; with `subsample = 1.0` the fit is fully
    /// deterministic regardless of seed.
    pub fn fit(
        x: &FeatureMatrix,
        labels: &[usize],
        n_classes: usize,
        config: &GbdtConfig,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;

        let n_rows = x.n_rows();
        if n_rows == 0 {
            return Err(PipelineError::training("cannot fit on an empty training set"));
        }
        if x.n_features() == 0 {
            return Err(PipelineError::training("no feature columns available for fitting"));
        }
        if labels.len() != n_rows {
            return Err(PipelineError::training(format!(
                "labels length {} != n_samples {}",
                labels.len(),
                n_rows
            )));
        }
        if n_classes < 2 {
            return Err(PipelineError::training(format!(
                "at least two classes are required, got {}",
                n_classes
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(PipelineError::training(format!(
                "label {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = ((n_rows as f64 * config.subsample).round() as usize).clamp(1, n_rows);

        // Raw scores start uniform; softmax of zeros is the uniform prior
        let mut raw = vec![0.0; n_rows * n_classes];
        let mut rounds = Vec::with_capacity(config.n_estimators);

        for round in 0..config.n_estimators {
            let probs: Vec<Vec<f64>> = raw.chunks(n_classes).map(softmax).collect();

            let rows: Vec<usize> = if sample_size < n_rows {
                let mut sampled = rand::seq::index::sample(&mut rng, n_rows, sample_size).into_vec();
                sampled.sort_unstable();
                sampled
            } else {
                (0..n_rows).collect()
            };

            let trees: Vec<Tree> = (0..n_classes)
                .into_par_iter()
                .map(|class| {
                    let mut grad = Vec::with_capacity(n_rows);
                    let mut hess = Vec::with_capacity(n_rows);
                    for (row, p) in probs.iter().enumerate() {
                        let target = if labels[row] == class { 1.0 } else { 0.0 };
                        grad.push(p[class] - target);
                        hess.push((2.0 * p[class] * (1.0 - p[class])).max(MIN_HESSIAN));
                    }
                    TreeBuilder::new(x, &grad, &hess, config).build(&rows)
                })
                .collect();

            for row in 0..n_rows {
                let features = x.row(row);
                for (class, tree) in trees.iter().enumerate() {
                    raw[row * n_classes + class] += tree.predict(features);
                }
            }

            if round == 0 {
                debug!(
                    "First round tree depths: {:?}",
                    trees.iter().map(Tree::depth).collect::<Vec<_>>()
                );
            }
            rounds.push(trees);
        }

        info!(
            "Fit {} boosting round(s) x {} class(es) on {} row(s), {} feature(s)",
            rounds.len(),
            n_classes,
            n_rows,
            x.n_features()
        );

        Ok(Self {
            rounds,
            n_classes,
            n_features: x.n_features(),
        })
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    fn raw_scores(&self, row: &[f64]) -> Vec<f64> {
        let mut raw = vec![0.0; self.n_classes];
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate() {
                raw[class] += tree.predict(row);
            }
        }
        raw
    }

    /// Class-probability vector per row, in row order
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        if x.n_features() != self.n_features {
            return Err(PipelineError::training(format!(
                "feature count mismatch: model has {}, input has {}",
                self.n_features,
                x.n_features()
            )));
        }

        Ok((0..x.n_rows())
            .into_par_iter()
            .map(|row| softmax(&self.raw_scores(x.row(row))))
            .collect())
    }

    /// Most probable class per row
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self.predict_proba(x)?.iter().map(|p| argmax(p)).collect())
    }
}
