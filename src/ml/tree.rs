// ============================================================
// Layer 5 — Greedy Recursive Encoder
// ============================================================
// Builds a binary tree over a sentence bottom-up:
//
//   1. Every word becomes a leaf holding its embedding column.
//   2. For every adjacent pair (c1, c2) compute the parent
//        a  = tanh(W1·c1 + W2·c2 + b1)
//        p  = a / ||a||
//      and its reconstruction of the children
//        c1' = tanh(W3·p + b2)     c2' = tanh(W4·p + b3)
//   3. Merge the pair with the lowest weighted error
//        ½ · ( n1/(n1+n2)·||c1 − c1'||² + n2/(n1+n2)·||c2 − c2'||² )
//      where n is the number of leaves under each child.
//   4. Repeat until one node is left.
//
// Nodes are stored leaves first, then internal nodes in merge
// order, so the root is always the last node and every child
// index is smaller than its parent's. The cost function relies
// on that ordering to backpropagate in a single reverse pass.
//
// Reference: Socher et al. (2011), §2.3 (Greedy unsupervised RAE)

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::data::vocabulary::UNKNOWN_INDEX;
use crate::domain::theta::{ParameterSet, Part};

/// Lower bound on ||a|| so normalization never divides by zero.
const MIN_NORM: f64 = 1e-12;

/// Everything the backward pass needs about one merge.
#[derive(Debug, Clone)]
pub struct Merge {
    pub left:         usize,
    pub right:        usize,
    /// tanh activation before normalization
    pub activation:   Array1<f64>,
    pub norm:         f64,
    pub left_recon:   Array1<f64>,
    pub right_recon:  Array1<f64>,
    pub left_weight:  f64,
    pub right_weight: f64,
    pub error:        f64,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf { word: usize },
    Internal(Merge),
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub vector: Array1<f64>,
    pub leaves: usize,
    pub kind:   NodeKind,
}

#[derive(Debug, Clone, Default)]
pub struct EncodedTree {
    pub nodes: Vec<TreeNode>,
}

impl EncodedTree {
    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.last()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Borrowed encoder weights plus the embedding lookup.
pub struct RecursiveEncoder<'a> {
    w1:         ArrayView2<'a, f64>,
    w2:         ArrayView2<'a, f64>,
    w3:         ArrayView2<'a, f64>,
    w4:         ArrayView2<'a, f64>,
    b1:         ArrayView1<'a, f64>,
    b2:         ArrayView1<'a, f64>,
    b3:         ArrayView1<'a, f64>,
    embeddings: ArrayView2<'a, f64>,
    anchor:     Option<ArrayView2<'a, f64>>,
}

impl<'a> RecursiveEncoder<'a> {
    /// Encoder whose leaves are exactly the embedding columns of `theta`.
    pub fn new(theta: &'a ParameterSet) -> Self {
        Self {
            w1:         theta.matrix(Part::W1),
            w2:         theta.matrix(Part::W2),
            w3:         theta.matrix(Part::W3),
            w4:         theta.matrix(Part::W4),
            b1:         theta.vector(Part::B1),
            b2:         theta.vector(Part::B2),
            b3:         theta.vector(Part::B3),
            embeddings: theta.embeddings(),
            anchor:     None,
        }
    }

    /// Encoder whose leaves are `anchor + theta.We`, i.e. `theta` holds
    /// an embedding delta on top of fixed embeddings.
    pub fn with_anchor(theta: &'a ParameterSet, anchor: ArrayView2<'a, f64>) -> Self {
        Self { anchor: Some(anchor), ..Self::new(theta) }
    }

    /// Leaf vector for `word`; indices past the dictionary use the unknown word.
    pub fn leaf(&self, word: usize) -> Array1<f64> {
        let word = if word < self.embeddings.ncols() { word } else { UNKNOWN_INDEX };
        let mut x = self.embeddings.column(word).to_owned();
        if let Some(anchor) = &self.anchor {
            x += &anchor.column(word);
        }
        x
    }

    pub fn encode(&self, words: &[usize]) -> EncodedTree {
        let mut nodes: Vec<TreeNode> = words
            .iter()
            .map(|&w| TreeNode {
                vector: self.leaf(w),
                leaves: 1,
                kind:   NodeKind::Leaf { word: w },
            })
            .collect();

        // indices of the nodes that still have no parent, left to right
        let mut frontier: Vec<usize> = (0..nodes.len()).collect();

        while frontier.len() > 1 {
            let mut best: Option<(usize, TreeNode)> = None;
            for j in 0..frontier.len() - 1 {
                let candidate = self.merge(&nodes, frontier[j], frontier[j + 1]);
                let better = match &best {
                    Some((_, b)) => merge_error(&candidate) < merge_error(b),
                    None         => true,
                };
                if better {
                    best = Some((j, candidate));
                }
            }

            let Some((j, parent)) = best else { break };
            nodes.push(parent);
            frontier[j] = nodes.len() - 1;
            frontier.remove(j + 1);
        }

        EncodedTree { nodes }
    }

    /// Parent of two existing nodes, with its reconstruction error.
    pub fn merge(&self, nodes: &[TreeNode], left: usize, right: usize) -> TreeNode {
        let c1 = &nodes[left].vector;
        let c2 = &nodes[right].vector;

        let activation = (self.w1.dot(c1) + self.w2.dot(c2) + &self.b1).mapv(f64::tanh);
        let norm       = activation.dot(&activation).sqrt().max(MIN_NORM);
        let parent     = &activation / norm;

        let left_recon  = (self.w3.dot(&parent) + &self.b2).mapv(f64::tanh);
        let right_recon = (self.w4.dot(&parent) + &self.b3).mapv(f64::tanh);

        let (n1, n2)     = (nodes[left].leaves, nodes[right].leaves);
        let left_weight  = n1 as f64 / (n1 + n2) as f64;
        let right_weight = n2 as f64 / (n1 + n2) as f64;

        let error = 0.5
            * (left_weight * squared_distance(c1, &left_recon)
                + right_weight * squared_distance(c2, &right_recon));

        TreeNode {
            vector: parent,
            leaves: n1 + n2,
            kind:   NodeKind::Internal(Merge {
                left,
                right,
                activation,
                norm,
                left_recon,
                right_recon,
                left_weight,
                right_weight,
                error,
            }),
        }
    }
}

fn merge_error(node: &TreeNode) -> f64 {
    match &node.kind {
        NodeKind::Internal(m) => m.error,
        NodeKind::Leaf { .. } => 0.0,
    }
}

fn squared_distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    (a - b).mapv(|x| x * x).sum()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::theta::Dimensions;
    use rand::{rngs::StdRng, SeedableRng};

    fn params(seed: u64) -> ParameterSet {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut theta = ParameterSet::random(Dimensions::new(4, 4, 4, 2, 10), &mut rng);
        // embeddings large enough to make reconstruction errors distinct
        theta.matrix_mut(Part::We).mapv_inplace(|x| x * 500.0);
        theta
    }

    #[test]
    fn test_single_word_is_its_own_root() {
        let theta = params(1);
        let tree  = RecursiveEncoder::new(&theta).encode(&[3]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().unwrap().vector, theta.embeddings().column(3).to_owned());
        assert!(matches!(tree.root().unwrap().kind, NodeKind::Leaf { word: 3 }));
    }

    #[test]
    fn test_empty_sentence_has_no_nodes() {
        let theta = params(1);
        assert!(RecursiveEncoder::new(&theta).encode(&[]).nodes.is_empty());
    }

    #[test]
    fn test_tree_shape() {
        let theta = params(2);
        let words = [1, 2, 3, 4, 5];
        let tree  = RecursiveEncoder::new(&theta).encode(&words);

        assert_eq!(tree.len(), 2 * words.len() - 1);
        assert_eq!(tree.root().unwrap().leaves, words.len());

        // every non-root node is a child exactly once, always of a later node
        let mut parent_of = vec![None; tree.len()];
        for (k, node) in tree.nodes.iter().enumerate() {
            if let NodeKind::Internal(m) = &node.kind {
                assert!(m.left < k && m.right < k);
                assert!(parent_of[m.left].replace(k).is_none());
                assert!(parent_of[m.right].replace(k).is_none());
                assert!((node.vector.dot(&node.vector) - 1.0).abs() < 1e-9);
            }
        }
        assert_eq!(parent_of.iter().filter(|p| p.is_none()).count(), 1);
    }

    #[test]
    fn test_first_merge_is_the_cheapest_pair() {
        let theta   = params(3);
        let encoder = RecursiveEncoder::new(&theta);
        let words   = [1, 2, 3, 4];
        let tree    = encoder.encode(&words);

        let leaves = &tree.nodes[..words.len()];
        let cheapest = (0..words.len() - 1)
            .map(|j| merge_error(&encoder.merge(leaves, j, j + 1)))
            .fold(f64::INFINITY, f64::min);

        assert!((merge_error(&tree.nodes[words.len()]) - cheapest).abs() < 1e-12);
    }

    #[test]
    fn test_anchor_is_added_to_leaves() {
        let theta  = params(4);
        let anchor = params(5);
        let encoder = RecursiveEncoder::with_anchor(&theta, anchor.embeddings());

        let expected = &theta.embeddings().column(2) + &anchor.embeddings().column(2);
        assert_eq!(encoder.leaf(2), expected);
    }

    #[test]
    fn test_out_of_dictionary_word_uses_unknown() {
        let theta   = params(6);
        let encoder = RecursiveEncoder::new(&theta);
        assert_eq!(encoder.leaf(99), encoder.leaf(UNKNOWN_INDEX));
    }
}
