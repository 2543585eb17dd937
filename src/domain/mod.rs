// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// pipeline works with. No file I/O lives here.
//
//   theta.rs        — ParameterSet: structured views over the
//                     flat parameter vector, and composition
//   example.rs      — LabeledExample / FeatureVector
//   dataset.rs      — ordered train/test sequences + categories
//   distribution.rs — validated per-category probabilities
//   accuracy.rs     — confusion-matrix accuracy summary
//   error.rs        — PipelineError, the core's fatal errors
//   traits.rs       — seams to the numeric collaborators
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod accuracy;
pub mod dataset;
pub mod distribution;
pub mod error;
pub mod example;
pub mod theta;
pub mod traits;
