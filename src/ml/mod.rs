// ============================================================
// Layer 5 — ML Layer (Recursive Autoencoder)
// ============================================================
// All numeric code lives here, on top of ndarray views over
// the flat ParameterSet vector. Nothing in this layer writes
// files; persistence goes through Layer 6.
//
//   tree.rs       — greedy recursive encoder: builds the binary
//                   tree of a sentence and its merge errors
//
//   cost.rs       — RaeCost: reconstruction + classification
//                   cost with its exact gradient
//
//   lbfgs.rs      — QnMinimizer: limited-memory quasi-Newton
//                   solver with Armijo backtracking
//
//   features.rs   — RaeFeatureExtractor: root + mean node vector
//
//   softmax.rs    — SoftmaxClassifier over feature vectors
//
//   trainer.rs    — TrainingController: initial parameters,
//                   solver run, embedding composition
//
//   inferencer.rs — InferenceController: dimension gate,
//                   ordered extraction and classification
//
// Reference: Socher et al. (2011) Semi-Supervised Recursive
//            Autoencoders for Predicting Sentiment Distributions
//            Nocedal & Wright, Numerical Optimization

/// Greedy tree construction over word embeddings
pub mod tree;

/// Differentiable RAE training objective
pub mod cost;

/// L-BFGS minimizer with iteration history
pub mod lbfgs;

/// Sentence features from an encoded tree
pub mod features;

/// Multinomial logistic regression classifier
pub mod softmax;

/// Unsupervised pretraining controller
pub mod trainer;

/// Inference controller producing an ordered Report
pub mod inferencer;
