// ============================================================
// Layer 3 — Accuracy Summary
// ============================================================
// Confusion-matrix based summary of a classifier run over a
// labeled set. Rows are gold labels, columns are predictions.
//
// Besides plain accuracy it reports macro-averaged F1, which
// is the more honest number when the categories are
// unbalanced.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accuracy {
    confusion: Vec<Vec<usize>>,
}

impl Accuracy {
    pub fn new(num_categories: usize) -> Self {
        Self { confusion: vec![vec![0; num_categories]; num_categories] }
    }

    /// Build from (gold, predicted) pairs.
    pub fn from_pairs(num_categories: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut acc = Self::new(num_categories);
        for (gold, predicted) in pairs {
            acc.record(gold, predicted);
        }
        acc
    }

    /// Count one prediction. Labels outside the category set are ignored.
    pub fn record(&mut self, gold: usize, predicted: usize) {
        if let Some(cell) = self.confusion.get_mut(gold).and_then(|row| row.get_mut(predicted)) {
            *cell += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.confusion.len()).map(|i| self.confusion[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.correct() as f64 / n as f64,
        }
    }

    /// Unweighted mean of per-category F1. Categories with no gold
    /// examples and no predictions are left out of the mean.
    pub fn macro_f1(&self) -> f64 {
        let n = self.confusion.len();
        let mut sum   = 0.0;
        let mut count = 0usize;

        for c in 0..n {
            let tp        = self.confusion[c][c] as f64;
            let gold      = self.confusion[c].iter().sum::<usize>() as f64;
            let predicted = (0..n).map(|r| self.confusion[r][c]).sum::<usize>() as f64;
            if gold == 0.0 && predicted == 0.0 {
                continue;
            }
            let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
            let recall    = if gold > 0.0 { tp / gold } else { 0.0 };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            sum   += f1;
            count += 1;
        }

        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    pub fn confusion(&self) -> &[Vec<usize>] {
        &self.confusion
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy={:.4} ({}/{}) macro_f1={:.4}",
            self.accuracy(),
            self.correct(),
            self.total(),
            self.macro_f1(),
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_counts() {
        let acc = Accuracy::from_pairs(2, [(0, 0), (0, 1), (1, 1), (1, 1)]);
        assert_eq!(acc.total(), 4);
        assert_eq!(acc.correct(), 3);
        assert!((acc.accuracy() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_macro_f1() {
        // class 0: p=1, r=0.5 -> f1=2/3 ; class 1: p=2/3, r=1 -> f1=0.8
        let acc = Accuracy::from_pairs(2, [(0, 0), (0, 1), (1, 1), (1, 1)]);
        let expected = (2.0 / 3.0 + 0.8) / 2.0;
        assert!((acc.macro_f1() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary() {
        let acc = Accuracy::new(3);
        assert_eq!(acc.accuracy(), 0.0);
        assert_eq!(acc.macro_f1(), 0.0);
        assert_eq!(acc.to_string(), "accuracy=0.0000 (0/0) macro_f1=0.0000");
    }
}
