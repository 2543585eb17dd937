// ============================================================
// Layer 3 — ProbabilityDistribution
// ============================================================
// A fixed mapping from category index to probability. It
// covers exactly the classifier's categories (index 0..C)
// and sums to 1 within 1e-6, so every probabilities file
// line has the same entries. The only way to build one is a
// softmax over one score per category.

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution {
    probs: Vec<f64>,
}

impl ProbabilityDistribution {
    /// Softmax over one score per category. Valid by construction.
    pub fn from_scores(scores: &[f64]) -> Self {
        Self { probs: softmax(scores) }
    }

    pub fn num_categories(&self) -> usize {
        self.probs.len()
    }

    /// (label, probability) in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.probs.iter().copied().enumerate()
    }

    /// Most probable category; the lowest index wins ties.
    pub fn argmax(&self) -> usize {
        self.probs
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0
    }
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sum(d: &ProbabilityDistribution) -> f64 {
        d.iter().map(|(_, p)| p).sum()
    }

    #[test]
    fn test_covers_every_category_in_order() {
        let d = ProbabilityDistribution::from_scores(&[0.0, 3.0_f64.ln()]);
        assert_eq!(d.num_categories(), 2);
        assert_eq!(d.argmax(), 1);

        let entries: Vec<(usize, f64)> = d.iter().collect();
        assert_eq!(entries[0].0, 0);
        assert_eq!(entries[1].0, 1);
        assert!((entries[0].1 - 0.25).abs() < 1e-12);
        assert!((entries[1].1 - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_handles_large_scores() {
        let d = ProbabilityDistribution::from_scores(&[1000.0, 1000.0, 990.0]);
        let p: Vec<f64> = d.iter().map(|(_, p)| p).collect();
        assert!((sum(&d) - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-12);
        assert_eq!(d.argmax(), 0);
    }

    #[test]
    fn test_sums_to_one() {
        for scores in [vec![-4.0, 0.5, 2.0, 7.5], vec![0.0], vec![-1e3, 1e3]] {
            let d = ProbabilityDistribution::from_scores(&scores);
            assert_eq!(d.num_categories(), scores.len());
            assert!((sum(&d) - 1.0).abs() < 1e-6);
        }
    }
}
