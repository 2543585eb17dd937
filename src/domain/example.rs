// ============================================================
// Layer 3 — Example and Feature Types
// ============================================================
// A LabeledExample is one sentence after vocabulary lookup:
// the word indices in reading order plus an optional gold
// category. A FeatureVector is what the feature extractor
// produces for that sentence; it keeps the gold label so the
// classifier can train or be scored on it.

use serde::{Deserialize, Serialize};

/// One sentence as dictionary indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub words: Vec<usize>,
    pub label: Option<usize>,
}

impl LabeledExample {
    pub fn new(words: Vec<usize>, label: Option<usize>) -> Self {
        Self { words, label }
    }

    #[cfg(test)]
    pub fn unlabeled(words: Vec<usize>) -> Self {
        Self { words, label: None }
    }
}

/// Fixed-length features for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub label:  Option<usize>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>, label: Option<usize>) -> Self {
        Self { values, label }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
