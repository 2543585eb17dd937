// ============================================================
// Layer 5 — Softmax Classifier
// ============================================================
// Multinomial logistic regression over RAE feature vectors.
//
//   P(c | x) = softmax(W·x + b)_c
//
// Training minimizes the mean cross-entropy of the labeled
// examples plus λ/2·||W||² (the bias is not regularized) with
// the same L-BFGS solver used for pretraining. Parameters are
// kept in one flat row-major C × (F + 1) vector whose last
// column is the bias, so the solver can work on it directly.
//
// Reference: Bishop, Pattern Recognition and Machine Learning §4.3.4

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::accuracy::Accuracy;
use crate::domain::distribution::{softmax, ProbabilityDistribution};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::example::FeatureVector;
use crate::domain::traits::{Classifier, DifferentiableFunction, Minimizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxClassifier {
    num_categories: usize,
    num_features:   usize,
    lambda:         f64,
    /// C × (F + 1), row-major; the last column is the bias
    weights:        Vec<f64>,
}

impl SoftmaxClassifier {
    pub fn new(num_categories: usize, num_features: usize, lambda: f64) -> Self {
        Self {
            num_categories,
            num_features,
            lambda,
            weights: vec![0.0; num_categories * (num_features + 1)],
        }
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Check that the stored weights match the declared shape.
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.num_categories * (self.num_features + 1);
        if self.num_categories == 0 {
            return Err("classifier declares zero categories".into());
        }
        if self.weights.len() != expected {
            return Err(format!(
                "classifier stores {} weights but {} categories × {} features require {}",
                self.weights.len(),
                self.num_categories,
                self.num_features,
                expected
            ));
        }
        Ok(())
    }

    /// Fit on the labeled examples of `data` and return the training accuracy.
    pub fn train<M: Minimizer>(
        &mut self,
        data:           &[FeatureVector],
        minimizer:      &mut M,
        tolerance:      f64,
        max_iterations: usize,
    ) -> PipelineResult<Accuracy> {
        let mut examples = Vec::new();
        for f in data {
            let Some(label) = f.label else { continue };
            if label >= self.num_categories {
                return Err(PipelineError::configuration(format!(
                    "label {label} outside {} categories",
                    self.num_categories
                )));
            }
            if f.len() != self.num_features {
                return Err(PipelineError::configuration(format!(
                    "feature vector has {} values, classifier expects {}",
                    f.len(),
                    self.num_features
                )));
            }
            examples.push((ArrayView1::from(&f.values[..]), label));
        }
        if examples.is_empty() {
            return Err(PipelineError::configuration("no labeled examples to train the classifier on"));
        }

        let cost = SoftmaxCost {
            examples,
            num_categories: self.num_categories,
            num_features:   self.num_features,
            lambda:         self.lambda,
        };
        self.weights = minimizer.minimize(&cost, tolerance, &self.weights, max_iterations)?;

        Ok(self.test(data))
    }

    fn weight_matrix(&self) -> ArrayView2<'_, f64> {
        ArrayView2::from_shape((self.num_categories, self.num_features + 1), &self.weights)
            .expect("weights match the declared shape")
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        scores(self.weight_matrix(), ArrayView1::from(x)).to_vec()
    }
}

impl Classifier for SoftmaxClassifier {
    fn num_categories(&self) -> usize {
        self.num_categories
    }

    fn probabilities(&self, features: &FeatureVector) -> ProbabilityDistribution {
        ProbabilityDistribution::from_scores(&self.scores(&features.values))
    }
}

/// W·x + b for a C × (F + 1) matrix with the bias in the last column.
fn scores(w: ArrayView2<'_, f64>, x: ArrayView1<'_, f64>) -> Array1<f64> {
    let (weights, bias) = w.split_at(Axis(1), w.ncols() - 1);
    weights.dot(&x) + &bias.column(0)
}

// ─── Training cost ────────────────────────────────────────────────────────────
struct SoftmaxCost<'a> {
    examples:       Vec<(ArrayView1<'a, f64>, usize)>,
    num_categories: usize,
    num_features:   usize,
    lambda:         f64,
}

impl DifferentiableFunction for SoftmaxCost<'_> {
    fn dimension(&self) -> usize {
        self.num_categories * (self.num_features + 1)
    }

    fn value_and_gradient(&self, x: &[f64]) -> PipelineResult<(f64, Vec<f64>)> {
        let shape = (self.num_categories, self.num_features + 1);
        let w = ArrayView2::from_shape(shape, x)
            .map_err(|e| PipelineError::UnusableIterate(e.to_string()))?;
        let f = self.num_features;
        let n = self.examples.len().max(1) as f64;

        let mut grad = Array2::<f64>::zeros(shape);
        let mut cost = 0.0;

        for (features, label) in &self.examples {
            let mut d = Array1::from(softmax(&scores(w, features.view()).to_vec()));
            cost -= d[*label].max(f64::MIN_POSITIVE).ln();
            d[*label] -= 1.0;

            for (c, &dc) in d.iter().enumerate() {
                grad.slice_mut(s![c, ..f]).scaled_add(dc, features);
                grad[[c, f]] += dc;
            }
        }

        cost /= n;
        grad /= n;

        let weights = w.slice(s![.., ..f]);
        cost += 0.5 * self.lambda * weights.iter().map(|v| v * v).sum::<f64>();
        grad.slice_mut(s![.., ..f]).scaled_add(self.lambda, &weights);

        let (gradient, _) = grad.into_raw_vec_and_offset();
        Ok((cost, gradient))
    }
}
