// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The controllers only talk to their numeric collaborators
// through these traits. The concrete recursive autoencoder,
// L-BFGS solver and softmax classifier live in Layer 5 and
// can be swapped (or faked in tests) without touching the
// orchestration code.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use super::accuracy::Accuracy;
use super::dataset::Dataset;
use super::distribution::ProbabilityDistribution;
use super::error::PipelineResult;
use super::example::{FeatureVector, LabeledExample};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce an ordered dataset.
///
/// Implementations:
///   - TextDatasetLoader → a directory of labels/vocab/train/test files
pub trait DatasetSource {
    fn load(&self) -> Result<Dataset>;
}

// ─── DifferentiableFunction ───────────────────────────────────────────────────
/// A scalar function of a flat parameter vector with its gradient.
///
/// Implementations:
///   - RaeCost      → reconstruction + classification cost of the RAE
///   - SoftmaxCost  → regularized cross-entropy of the classifier
pub trait DifferentiableFunction {
    /// Length of the parameter vector this function accepts.
    fn dimension(&self) -> usize;

    /// Cost at `x` and its gradient (same length as `x`).
    fn value_and_gradient(&self, x: &[f64]) -> PipelineResult<(f64, Vec<f64>)>;
}

// ─── Minimizer ────────────────────────────────────────────────────────────────
/// An iterative optimizer bounded by an iteration budget.
///
/// Implementations:
///   - QnMinimizer → limited-memory quasi-Newton (L-BFGS)
pub trait Minimizer {
    /// Return the best iterate found. Reaching `max_iterations` without
    /// meeting `tolerance` is not an error.
    fn minimize<F: DifferentiableFunction + ?Sized>(
        &mut self,
        function:       &F,
        tolerance:      f64,
        initial:        &[f64],
        max_iterations: usize,
    ) -> PipelineResult<Vec<f64>>;
}

// ─── FeatureExtractor ─────────────────────────────────────────────────────────
/// Turns an example into a fixed-length feature vector.
///
/// Implementations:
///   - RaeFeatureExtractor → root + mean node vector of the greedy tree
pub trait FeatureExtractor {
    fn extract(&self, example: &LabeledExample) -> FeatureVector;

    /// One feature vector per example, in input order.
    fn extract_all(&self, examples: &[LabeledExample]) -> Vec<FeatureVector> {
        examples.iter().map(|e| self.extract(e)).collect()
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A trained classifier over feature vectors.
///
/// Implementations:
///   - SoftmaxClassifier → multinomial logistic regression
pub trait Classifier {
    fn num_categories(&self) -> usize;

    /// Full distribution over the classifier's categories.
    fn probabilities(&self, features: &FeatureVector) -> ProbabilityDistribution;

    fn predict(&self, features: &FeatureVector) -> usize {
        self.probabilities(features).argmax()
    }

    /// Score the labeled examples in `data`; unlabeled ones are skipped.
    fn test(&self, data: &[FeatureVector]) -> Accuracy {
        Accuracy::from_pairs(
            self.num_categories(),
            data.iter()
                .filter_map(|f| f.label.map(|gold| (gold, self.predict(f)))),
        )
    }
}
