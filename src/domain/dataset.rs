// ============================================================
// Layer 3 — Dataset
// ============================================================
// What the loader hands to the controllers: the category
// names (their order defines the label indices), the size of
// the vocabulary the word indices were drawn from, and the
// training and test sequences in file order.
//
// Input order is significant. Line i of every output file is
// derived from test[i], so nothing downstream may reorder it.

use super::example::LabeledExample;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub categories:      Vec<String>,
    pub vocabulary_size: usize,
    pub train:           Vec<LabeledExample>,
    pub test:            Vec<LabeledExample>,
}

impl Dataset {
    pub fn num_categories(&self) -> usize {
        self.categories.len()
    }

    /// True when there is a test set and every test example has a gold label.
    pub fn test_labels_known(&self) -> bool {
        !self.test.is_empty() && self.test.iter().all(|e| e.label.is_some())
    }
}
