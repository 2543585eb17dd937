// ============================================================
// Layer 4 — Data Loading
// ============================================================
// Turns a data directory into a Dataset:
//
//   labels.txt / vocab.txt / train.txt / test.txt
//       │
//       ▼
//   TextDatasetLoader   → parses lines, resolves labels
//       │
//       ▼
//   Vocabulary          → word → dictionary index
//       │
//       ▼
//   Dataset             → ordered LabeledExamples (Layer 3)
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads the text files of a data directory
pub mod loader;

/// Word to index mapping with a reserved unknown word
pub mod vocabulary;
