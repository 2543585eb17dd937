// ============================================================
// Layer 5 — RAE Feature Extractor
// ============================================================
// Encodes each sentence with the trained parameters and
// summarizes the tree as one fixed-length vector:
//
//   [ root vector (H) | mean of all node vectors (H) ]
//
// The root carries the composed meaning of the whole sentence;
// the mean keeps some of the word-level signal that the
// normalized parents wash out. An empty sentence maps to all
// zeros so every example still produces exactly one vector.

use ndarray::Array1;

use super::tree::RecursiveEncoder;
use crate::domain::example::{FeatureVector, LabeledExample};
use crate::domain::theta::{Dimensions, ParameterSet};
use crate::domain::traits::FeatureExtractor;

/// Length of the feature vector produced for `dims`.
pub fn feature_size(dims: &Dimensions) -> usize {
    2 * dims.hidden_size
}

pub struct RaeFeatureExtractor<'a> {
    encoder: RecursiveEncoder<'a>,
    size:    usize,
}

impl<'a> RaeFeatureExtractor<'a> {
    pub fn new(theta: &'a ParameterSet) -> Self {
        Self {
            encoder: RecursiveEncoder::new(theta),
            size:    feature_size(&theta.dims()),
        }
    }
}

impl FeatureExtractor for RaeFeatureExtractor<'_> {
    fn extract(&self, example: &LabeledExample) -> FeatureVector {
        let tree = self.encoder.encode(&example.words);
        let Some(root) = tree.root() else {
            return FeatureVector::new(vec![0.0; self.size], example.label);
        };

        let mut mean = Array1::<f64>::zeros(root.vector.len());
        for node in &tree.nodes {
            mean += &node.vector;
        }
        mean /= tree.len() as f64;

        let mut values = root.vector.to_vec();
        values.extend(mean.iter());

        FeatureVector::new(values, example.label)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::theta::Part;
    use rand::{rngs::StdRng, SeedableRng};

    fn theta() -> ParameterSet {
        let mut rng = StdRng::seed_from_u64(9);
        let mut t = ParameterSet::random(Dimensions::new(4, 4, 4, 2, 12), &mut rng);
        t.matrix_mut(Part::We).mapv_inplace(|x| x * 400.0);
        t
    }

    #[test]
    fn test_feature_length_and_label() {
        let t  = theta();
        let fe = RaeFeatureExtractor::new(&t);
        let f  = fe.extract(&LabeledExample::new(vec![1, 2, 3], Some(1)));
        assert_eq!(f.len(), 8);
        assert_eq!(f.label, Some(1));
    }

    #[test]
    fn test_single_word_features() {
        let t  = theta();
        let fe = RaeFeatureExtractor::new(&t);
        let f  = fe.extract(&LabeledExample::unlabeled(vec![5]));

        // root and mean are both the word's embedding
        let emb = t.embeddings().column(5).to_vec();
        assert_eq!(&f.values[..4], emb.as_slice());
        assert_eq!(&f.values[4..], emb.as_slice());
    }

    #[test]
    fn test_empty_sentence_gives_zeros() {
        let t  = theta();
        let fe = RaeFeatureExtractor::new(&t);
        let f  = fe.extract(&LabeledExample::new(vec![], Some(0)));
        assert_eq!(f.values, vec![0.0; 8]);
        assert_eq!(f.label, Some(0));
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let t  = theta();
        let fe = RaeFeatureExtractor::new(&t);
        let examples: Vec<_> = (1..6)
            .map(|w| LabeledExample::unlabeled(vec![w, (w + 3) % 12]))
            .collect();

        let all = fe.extract_all(&examples);
        assert_eq!(all.len(), examples.len());
        for (e, f) in examples.iter().zip(&all) {
            assert_eq!(f, &fe.extract(e));
        }
    }
}
