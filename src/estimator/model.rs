//! Regression tree fitted on `(speed, distance)` samples.
//!
//! A CART-style tree: each split minimizes the summed squared error of the
//! two children, candidate thresholds sit halfway between adjacent distinct
//! feature values, and growth stops once a node is pure or holds a single
//! sample. Leaves predict the mean target of their samples.

use crate::error::{Error, Result};

/// Number of input features (speed, distance).
pub const FEATURE_COUNT: usize = 2;

/// A single training observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; FEATURE_COUNT],
    pub target: f64,
}

impl Sample {
    pub fn new(speed: f64, distance: f64, congestion: f64) -> Self {
        Self {
            features: [speed, distance],
            target: congestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Best split found for a node.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    /// Position in the feature-sorted index list where the right child starts.
    at: usize,
    error: f64,
}

/// A fitted regression tree. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit a fully grown tree on `samples`.
    pub fn fit(samples: &[Sample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::Model("cannot fit a model without samples".into()));
        }
        if let Some(bad) = samples
            .iter()
            .find(|s| !s.target.is_finite() || s.features.iter().any(|f| !f.is_finite()))
        {
            return Err(Error::Model(format!("non-finite calibration sample: {:?}", bad)));
        }

        let indices: Vec<usize> = (0..samples.len()).collect();
        Ok(Self {
            root: grow(samples, indices),
        })
    }

    /// Predict the target for one `[speed, distance]` input.
    pub fn predict(&self, features: [f64; FEATURE_COUNT]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }
}

fn grow(samples: &[Sample], indices: Vec<usize>) -> Node {
    let value = mean(samples, &indices);
    let error = squared_error(samples, &indices);
    if indices.len() < 2 || error == 0.0 {
        return Node::Leaf { value };
    }

    let Some(best) = best_split(samples, &indices) else {
        return Node::Leaf { value };
    };
    if best.error >= error {
        return Node::Leaf { value };
    }

    let mut sorted = indices;
    sort_by_feature(samples, &mut sorted, best.feature);
    let right = sorted.split_off(best.at);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(grow(samples, sorted)),
        right: Box::new(grow(samples, right)),
    }
}

/// Scan every feature and threshold; the first strictly best candidate wins.
fn best_split(samples: &[Sample], indices: &[usize]) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for feature in 0..FEATURE_COUNT {
        let mut sorted = indices.to_vec();
        sort_by_feature(samples, &mut sorted, feature);

        for at in 1..sorted.len() {
            let lo = samples[sorted[at - 1]].features[feature];
            let hi = samples[sorted[at]].features[feature];
            if lo == hi {
                continue;
            }

            let (left, right) = sorted.split_at(at);
            let error = squared_error(samples, left) + squared_error(samples, right);
            if best.map_or(true, |b| error < b.error) {
                best = Some(Candidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    at,
                    error,
                });
            }
        }
    }

    best
}

fn sort_by_feature(samples: &[Sample], indices: &mut [usize], feature: usize) {
    // Stable sort keeps ties in input order
    indices.sort_by(|&a, &b| {
        samples[a].features[feature].total_cmp(&samples[b].features[feature])
    });
}

fn mean(samples: &[Sample], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| samples[i].target).sum::<f64>() / indices.len() as f64
}

fn squared_error(samples: &[Sample], indices: &[usize]) -> f64 {
    let m = mean(samples, indices);
    indices
        .iter()
        .map(|&i| {
            let d = samples[i].target - m;
            d * d
        })
        .sum()
}
