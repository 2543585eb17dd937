// ============================================================
// Layer 5 — Pretraining Controller
// ============================================================
// Drives the unsupervised stage end to end:
//
//   1. initial  = random ParameterSet with the resolved dimensions
//   2. cost     = RaeCost bound to the examples, with initial.We
//                 as the fixed embedding anchor
//   3. x*       = minimizer(cost, initial.flat, tol, max_iter)
//   4. solved   = x* viewed with the same dimensions
//   5. final    = solved with final.We = solved.We + initial.We
//
// The solver is iteration-bounded, so x* is its last accepted
// iterate whether or not the tolerance was reached. Any solver
// error aborts the run and nothing is returned.

use rand::Rng;

use super::cost::{RaeCost, RaeHyperParams};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::example::LabeledExample;
use crate::domain::theta::{Dimensions, LayoutError, ParameterSet};
use crate::domain::traits::Minimizer;

#[derive(Debug, Clone, Copy)]
pub struct TrainingController {
    pub dims:           Dimensions,
    pub hyper:          RaeHyperParams,
    pub tolerance:      f64,
    pub max_iterations: usize,
}

impl TrainingController {
    pub fn new(
        dims:           Dimensions,
        hyper:          RaeHyperParams,
        tolerance:      f64,
        max_iterations: usize,
    ) -> Self {
        Self { dims, hyper, tolerance, max_iterations }
    }

    pub fn run<M, R>(
        &self,
        examples:  &[LabeledExample],
        minimizer: &mut M,
        rng:       &mut R,
    ) -> PipelineResult<ParameterSet>
    where
        M: Minimizer,
        R: Rng + ?Sized,
    {
        let initial = ParameterSet::random(self.dims, rng);
        tracing::info!(
            "Pretraining RAE: {} ({} parameters) on {} examples",
            self.dims,
            initial.len(),
            examples.len()
        );

        let solution = {
            let cost = RaeCost::new(self.dims, self.hyper, initial.embeddings(), examples);
            minimizer.minimize(&cost, self.tolerance, initial.as_slice(), self.max_iterations)?
        };

        let solved = ParameterSet::from_flat(self.dims, solution).map_err(solver_layout_error)?;
        let trained = ParameterSet::compose(&initial, solved).map_err(solver_layout_error)?;

        tracing::info!("Pretraining finished");
        Ok(trained)
    }
}

fn solver_layout_error(e: LayoutError) -> PipelineError {
    PipelineError::UnusableIterate(e.to_string())
}
