// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the file system on behalf of the
// controllers:
//
//   checkpoint.rs — Saving and loading the trained model,
//                   the classifier and the training config.
//                   The model file carries its dimensions and
//                   a format version so loads can be checked.
//
//   report.rs     — Features and probabilities output files,
//                   plus the accuracy summary line.
//
//   metrics.rs    — Per-iteration solver history as CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §12 (I/O and File Handling)

/// Model, classifier and config persistence
pub mod checkpoint;

/// Ordered output files and accuracy line
pub mod report;

/// Solver history CSV logger
pub mod metrics;
