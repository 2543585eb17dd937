// ============================================================
// Layer 5 — Quasi-Newton Minimizer (L-BFGS)
// ============================================================
// Limited-memory BFGS: keeps the last `memory` pairs
//   s = x_{k+1} − x_k      y = g_{k+1} − g_k
// and uses them (two-loop recursion) to turn the gradient into
// a search direction that approximates a Newton step.
//
// Each iteration backtracks along the direction until the
// Armijo condition holds:
//   f(x + t·d) ≤ f(x) + c1 · t · (g·d)
//
// The run stops at the first of:
//   - ||g|| ≤ tol · max(1, ||x||)
//   - relative cost change < tol
//   - a line search that finds no acceptable step
//   - the iteration budget
// and always returns the last accepted iterate. Stopping on the
// budget is normal, not a failure.
//
// Reference: Nocedal & Wright, Numerical Optimization §7.2
//            Liu & Nocedal (1989) L-BFGS

use std::collections::VecDeque;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::{DifferentiableFunction, Minimizer};

/// Sufficient-decrease constant c1.
const ARMIJO: f64 = 1e-4;
/// Step shrink factor while backtracking.
const BACKTRACK: f64 = 0.5;
/// Curvature pairs with s·y at or below this are dropped.
const MIN_CURVATURE: f64 = 1e-10;

/// Progress of one accepted iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration:     usize,
    pub cost:          f64,
    pub gradient_norm: f64,
    pub step:          f64,
    /// Function evaluations spent in this iteration's line search
    pub evaluations:   usize,
}

/// (s, y, 1 / s·y)
type CurvaturePair = (Array1<f64>, Array1<f64>, f64);

pub struct QnMinimizer {
    memory:         usize,
    max_backtracks: usize,
    history:        Vec<IterationRecord>,
}

impl Default for QnMinimizer {
    fn default() -> Self {
        Self::new(10)
    }
}

impl QnMinimizer {
    pub fn new(memory: usize) -> Self {
        Self {
            memory:         memory.max(1),
            max_backtracks: 40,
            history:        Vec::new(),
        }
    }

    /// Records of the most recent `minimize` call.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }
}

impl Minimizer for QnMinimizer {
    fn minimize<F: DifferentiableFunction + ?Sized>(
        &mut self,
        function:       &F,
        tolerance:      f64,
        initial:        &[f64],
        max_iterations: usize,
    ) -> PipelineResult<Vec<f64>> {
        self.history.clear();

        if initial.len() != function.dimension() {
            return Err(PipelineError::UnusableIterate(format!(
                "initial point has {} values, function expects {}",
                initial.len(),
                function.dimension()
            )));
        }

        let mut x = Array1::from(initial.to_vec());
        let (mut fx, mut g) = evaluate(function, &x, 0)?;
        if !fx.is_finite() {
            return Err(PipelineError::Solver {
                iteration: 0,
                reason:    format!("initial cost is {fx}"),
            });
        }
        tracing::debug!("Solver start: cost={:.6} |g|={:.3e}", fx, norm(&g));

        let mut memory: VecDeque<CurvaturePair> = VecDeque::with_capacity(self.memory);

        for iteration in 1..=max_iterations {
            let g_norm = norm(&g);
            if g_norm <= tolerance * norm(&x).max(1.0) {
                tracing::debug!("Gradient norm {:.3e} below tolerance", g_norm);
                break;
            }

            let mut direction = two_loop(&g, &memory);
            let mut slope     = direction.dot(&g);
            if !(slope < 0.0) {
                // not a descent direction: restart from steepest descent
                memory.clear();
                direction = g.mapv(|v| -v);
                slope     = -g_norm * g_norm;
            }

            // ── Backtracking line search ──────────────────────────────────────
            let mut step = if memory.is_empty() { (1.0 / g_norm).min(1.0) } else { 1.0 };
            let mut evaluations = 0;
            let mut accepted = None;
            while evaluations < self.max_backtracks {
                let candidate = &x + &(&direction * step);
                let (f_new, g_new) = evaluate(function, &candidate, iteration)?;
                evaluations += 1;
                if f_new.is_finite() && f_new <= fx + ARMIJO * step * slope {
                    accepted = Some((candidate, f_new, g_new));
                    break;
                }
                step *= BACKTRACK;
            }

            let Some((x_new, f_new, g_new)) = accepted else {
                tracing::debug!("Line search failed at iteration {}; keeping current iterate", iteration);
                break;
            };

            // ── Curvature update ──────────────────────────────────────────────
            let s  = &x_new - &x;
            let y  = &g_new - &g;
            let sy = s.dot(&y);
            if sy > MIN_CURVATURE {
                if memory.len() == self.memory {
                    memory.pop_front();
                }
                memory.push_back((s, y, 1.0 / sy));
            }

            let relative_change = (fx - f_new).abs() / fx.abs().max(f_new.abs()).max(1.0);
            x  = x_new;
            fx = f_new;
            g  = g_new;

            let record = IterationRecord {
                iteration,
                cost: fx,
                gradient_norm: norm(&g),
                step,
                evaluations,
            };
            tracing::debug!(
                "Iteration {:>4}: cost={:.6} |g|={:.3e} step={:.3e}",
                iteration,
                record.cost,
                record.gradient_norm,
                step
            );
            self.history.push(record);

            if relative_change < tolerance {
                break;
            }
        }

        Ok(x.to_vec())
    }
}

fn evaluate<F: DifferentiableFunction + ?Sized>(
    function:  &F,
    x:         &Array1<f64>,
    iteration: usize,
) -> PipelineResult<(f64, Array1<f64>)> {
    let point = x.as_slice().expect("owned 1-D arrays are contiguous");
    let (value, grad) = function.value_and_gradient(point)?;
    if grad.len() != x.len() {
        return Err(PipelineError::Solver {
            iteration,
            reason: format!("gradient has {} values, expected {}", grad.len(), x.len()),
        });
    }
    Ok((value, Array1::from(grad)))
}

/// −H·g using the stored curvature pairs, oldest first.
fn two_loop(g: &Array1<f64>, memory: &VecDeque<CurvaturePair>) -> Array1<f64> {
    let mut q = g.clone();
    let mut alphas = Vec::with_capacity(memory.len());

    for (s, y, rho) in memory.iter().rev() {
        let a = rho * s.dot(&q);
        q.scaled_add(-a, y);
        alphas.push(a);
    }

    // initial Hessian scaling γ = s·y / y·y of the newest pair
    if let Some((s, y, _)) = memory.back() {
        q *= s.dot(y) / y.dot(y);
    }

    for ((s, y, rho), a) in memory.iter().zip(alphas.iter().rev()) {
        let b = rho * y.dot(&q);
        q.scaled_add(a - b, s);
    }

    q.mapv_into(|v| -v)
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = Σ (i+1)·(x_i − i)²
    struct Quadratic(usize);

    impl DifferentiableFunction for Quadratic {
        fn dimension(&self) -> usize {
            self.0
        }

        fn value_and_gradient(&self, x: &[f64]) -> PipelineResult<(f64, Vec<f64>)> {
            let mut value = 0.0;
            let mut grad  = vec![0.0; x.len()];
            for (i, &xi) in x.iter().enumerate() {
                let w = (i + 1) as f64;
                let d = xi - i as f64;
                value  += w * d * d;
                grad[i] = 2.0 * w * d;
            }
            Ok((value, grad))
        }
    }

    struct Failing;

    impl DifferentiableFunction for Failing {
        fn dimension(&self) -> usize {
            2
        }

        fn value_and_gradient(&self, _x: &[f64]) -> PipelineResult<(f64, Vec<f64>)> {
            Err(PipelineError::Solver { iteration: 0, reason: "boom".into() })
        }
    }

    struct NotANumber;

    impl DifferentiableFunction for NotANumber {
        fn dimension(&self) -> usize {
            1
        }

        fn value_and_gradient(&self, _x: &[f64]) -> PipelineResult<(f64, Vec<f64>)> {
            Ok((f64::NAN, vec![0.0]))
        }
    }

    #[test]
    fn test_converges_on_quadratic() {
        let f = Quadratic(6);
        let mut solver = QnMinimizer::default();
        let x = solver.minimize(&f, 1e-10, &[0.0; 6], 200).unwrap();

        for (i, xi) in x.iter().enumerate() {
            assert!((xi - i as f64).abs() < 1e-3, "x[{i}] = {xi}");
        }
        assert!(!solver.history().is_empty());
    }

    #[test]
    fn test_respects_iteration_budget() {
        let f = Quadratic(4);
        let start = [10.0; 4];
        let mut solver = QnMinimizer::default();
        let x = solver.minimize(&f, 1e-12, &start, 1).unwrap();

        assert_eq!(x.len(), 4);
        assert!(solver.history().len() <= 1);
        let (before, _) = f.value_and_gradient(&start).unwrap();
        let (after, _)  = f.value_and_gradient(&x).unwrap();
        assert!(after <= before);
    }

    #[test]
    fn test_history_costs_never_increase() {
        let f = Quadratic(5);
        let mut solver = QnMinimizer::new(3);
        solver.minimize(&f, 1e-12, &[-3.0; 5], 50).unwrap();

        let costs: Vec<f64> = solver.history().iter().map(|r| r.cost).collect();
        assert!(costs.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_cost_failure_propagates() {
        let mut solver = QnMinimizer::default();
        let err = solver.minimize(&Failing, 1e-6, &[0.0, 0.0], 10).unwrap_err();
        assert!(matches!(err, PipelineError::Solver { .. }));
    }

    #[test]
    fn test_non_finite_start_is_rejected() {
        let mut solver = QnMinimizer::default();
        let err = solver.minimize(&NotANumber, 1e-6, &[0.0], 10).unwrap_err();
        assert!(err.to_string().contains("initial cost"));
    }

    #[test]
    fn test_wrong_initial_length() {
        let mut solver = QnMinimizer::default();
        assert!(solver.minimize(&Quadratic(3), 1e-6, &[0.0; 2], 10).is_err());
    }
}
