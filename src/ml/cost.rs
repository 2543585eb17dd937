// ============================================================
// Layer 5 — Semi-Supervised RAE Cost
// ============================================================
// The differentiable function the quasi-Newton solver
// minimizes during pretraining. Its input is a flat vector
// laid out exactly like a ParameterSet, except that the
// embedding view holds a DELTA: the leaves the encoder sees
// are `anchor + delta`, where the anchor is the initial
// embedding matrix and never changes.
//
// Per non-empty example:
//   (1 − α) · Σ merge reconstruction errors
//   +     α · Σ cross-entropy of softmax(Wcat·x + bcat) at every
//               node x, only when the example is labeled
//
// Total = mean over examples
//       + λ/2 · ||W1, W2, W3, W4, Wcat||²
//       + β·λ/2 · ||delta||²
//
// The gradient is exact for the tree the greedy encoder picked
// at this point; the discrete structure is held fixed.
//
// Reference: Socher et al. (2011), §3 (Semi-supervised RAE)
//            Goller & Küchler (1996) Backpropagation through structure

use ndarray::{Array1, ArrayView2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

use super::tree::{NodeKind, RecursiveEncoder};
use crate::data::vocabulary::UNKNOWN_INDEX;
use crate::domain::distribution::softmax;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::example::LabeledExample;
use crate::domain::theta::{Dimensions, ParameterSet, Part};
use crate::domain::traits::DifferentiableFunction;

/// Weights of the cost terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaeHyperParams {
    /// Share of the classification error; reconstruction gets 1 − alpha_cat.
    pub alpha_cat: f64,
    /// Regularization of the embedding delta relative to the weights.
    pub beta:      f64,
    /// L2 weight on W1..W4 and Wcat.
    pub lambda:    f64,
}

pub struct RaeCost<'a> {
    dims:     Dimensions,
    hyper:    RaeHyperParams,
    anchor:   ArrayView2<'a, f64>,
    examples: &'a [LabeledExample],
}

impl<'a> RaeCost<'a> {
    /// `anchor` must be an E×D matrix matching `dims`.
    pub fn new(
        dims:     Dimensions,
        hyper:    RaeHyperParams,
        anchor:   ArrayView2<'a, f64>,
        examples: &'a [LabeledExample],
    ) -> Self {
        Self { dims, hyper, anchor, examples }
    }

    /// Unregularized cost of one example; accumulates its gradient into `grad`.
    fn example_cost(
        &self,
        encoder: &RecursiveEncoder<'_>,
        theta:   &ParameterSet,
        example: &LabeledExample,
        grad:    &mut ParameterSet,
    ) -> f64 {
        let tree  = encoder.encode(&example.words);
        let nodes = &tree.nodes;
        let alpha = self.hyper.alpha_cat;

        // dCost/d(node vector), filled top-down
        let mut deltas: Vec<Array1<f64>> = nodes
            .iter()
            .map(|n| Array1::zeros(n.vector.len()))
            .collect();
        let mut cost = 0.0;

        // ── Classification error at every node ──────────────────────────────
        if let Some(label) = example.label {
            let w_cat = theta.matrix(Part::WCat);
            let b_cat = theta.vector(Part::BCat);

            for (k, node) in nodes.iter().enumerate() {
                let scores = w_cat.dot(&node.vector) + &b_cat;
                let mut d_scores = Array1::from(softmax(&scores.to_vec()));
                cost += -alpha * d_scores[label].max(f64::MIN_POSITIVE).ln();

                d_scores[label] -= 1.0;
                d_scores *= alpha;
                add_outer(&mut grad.matrix_mut(Part::WCat), &d_scores, &node.vector);
                grad.vector_mut(Part::BCat).scaled_add(1.0, &d_scores);
                deltas[k] += &w_cat.t().dot(&d_scores);
            }
        }

        // ── Reconstruction error, root first ────────────────────────────────
        let rec = 1.0 - alpha;
        let w1  = theta.matrix(Part::W1);
        let w2  = theta.matrix(Part::W2);
        let w3  = theta.matrix(Part::W3);
        let w4  = theta.matrix(Part::W4);

        for k in (0..nodes.len()).rev() {
            let NodeKind::Internal(m) = &nodes[k].kind else { continue };
            let p  = &nodes[k].vector;
            let c1 = &nodes[m.left].vector;
            let c2 = &nodes[m.right].vector;
            cost += rec * m.error;

            // dE/dc = rec·w·(c − c')   and   dE/dz' = −dE/dc ⊙ (1 − c'²)
            let d_c1 = (c1 - &m.left_recon) * (rec * m.left_weight);
            let d_c2 = (c2 - &m.right_recon) * (rec * m.right_weight);
            let d_z1 = m.left_recon.mapv(|y| y * y - 1.0) * &d_c1;
            let d_z2 = m.right_recon.mapv(|y| y * y - 1.0) * &d_c2;

            add_outer(&mut grad.matrix_mut(Part::W3), &d_z1, p);
            add_outer(&mut grad.matrix_mut(Part::W4), &d_z2, p);
            grad.vector_mut(Part::B2).scaled_add(1.0, &d_z1);
            grad.vector_mut(Part::B3).scaled_add(1.0, &d_z2);

            let d_p = &deltas[k] + &w3.t().dot(&d_z1) + &w4.t().dot(&d_z2);

            // p = a / ||a||  →  da = (dp − p·(p·dp)) / ||a||
            let d_a = (&d_p - &(p * p.dot(&d_p))) / m.norm;
            let d_z = d_a * &m.activation.mapv(|a| 1.0 - a * a);

            add_outer(&mut grad.matrix_mut(Part::W1), &d_z, c1);
            add_outer(&mut grad.matrix_mut(Part::W2), &d_z, c2);
            grad.vector_mut(Part::B1).scaled_add(1.0, &d_z);

            let (left, right) = (m.left, m.right);
            deltas[left]  += &(d_c1 + &w1.t().dot(&d_z));
            deltas[right] += &(d_c2 + &w2.t().dot(&d_z));
        }

        // ── Leaves feed the embedding delta ─────────────────────────────────
        let mut we_grad = grad.matrix_mut(Part::We);
        for (k, node) in nodes.iter().enumerate() {
            if let NodeKind::Leaf { word } = &node.kind {
                let word = if *word < self.dims.dictionary_size { *word } else { UNKNOWN_INDEX };
                we_grad.column_mut(word).scaled_add(1.0, &deltas[k]);
            }
        }

        cost
    }
}

impl DifferentiableFunction for RaeCost<'_> {
    fn dimension(&self) -> usize {
        self.dims.num_params()
    }

    fn value_and_gradient(&self, x: &[f64]) -> PipelineResult<(f64, Vec<f64>)> {
        let theta = ParameterSet::from_flat(self.dims, x.to_vec())
            .map_err(|e| PipelineError::UnusableIterate(e.to_string()))?;
        let encoder = RecursiveEncoder::with_anchor(&theta, self.anchor.view());

        let mut grad    = ParameterSet::zeros(self.dims);
        let mut cost    = 0.0;
        let mut counted = 0usize;
        for example in self.examples.iter().filter(|e| !e.words.is_empty()) {
            cost    += self.example_cost(&encoder, &theta, example, &mut grad);
            counted += 1;
        }

        let scale = 1.0 / counted.max(1) as f64;
        cost *= scale;
        let mut gradient = grad.into_flat();
        gradient.iter_mut().for_each(|g| *g *= scale);

        for (part, range) in theta.layout().iter() {
            let weight = match part {
                Part::We                => self.hyper.beta * self.hyper.lambda,
                p if p.is_weight()      => self.hyper.lambda,
                _                       => continue,
            };
            for i in range {
                cost        += 0.5 * weight * x[i] * x[i];
                gradient[i] += weight * x[i];
            }
        }

        Ok((cost, gradient))
    }
}

/// target += column · rowᵀ
fn add_outer(target: &mut ArrayViewMut2<'_, f64>, column: &Array1<f64>, row: &Array1<f64>) {
    for (mut target_row, &c) in target.rows_mut().into_iter().zip(column) {
        target_row.scaled_add(c, row);
    }
}
