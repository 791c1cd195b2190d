use argmin::{argmin_error_closure, core::*};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OMatrix, OVector};
use num_traits::Float;

use crate::misc::{all_finite, FloatingPoint};

use super::MinimizerError;

/// Iteration state of the quasi-Newton solver over an `N` dimensional parameter
pub type QuasiNewtonState<F, N> =
    IterState<OVector<F, N>, OVector<F, N>, (), OMatrix<F, N, N>, (), F>;

/// Quasi-Newton (BFGS) method with a backtracking line search
/// The inverse hessian approximation starts from the identity.
/// Original source: https://argmin-rs.github.io/argmin/argmin/solver/quasinewton/struct.BFGS.html
#[derive(Clone, Debug)]
pub struct QuasiNewton<F> {
    /// Tolerance for the step size in the line search and the gradient norm
    step_size_tolerance: F,
    /// Tolerance for the change of the cost between iterations
    cost_tolerance: F,
}

impl<F: FloatingPoint> Default for QuasiNewton<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FloatingPoint> QuasiNewton<F> {
    pub fn new() -> Self {
        Self {
            step_size_tolerance: F::from_f64_lossy(1e-10),
            cost_tolerance: F::from_f64_lossy(1e-14),
        }
    }

    pub fn with_step_size_tolerance(mut self, tol: F) -> Self {
        self.step_size_tolerance = tol;
        self
    }

    pub fn with_cost_tolerance(mut self, tol: F) -> Self {
        self.cost_tolerance = tol;
        self
    }

    pub fn step_size_tolerance(&self) -> F {
        self.step_size_tolerance
    }

    pub fn cost_tolerance(&self) -> F {
        self.cost_tolerance
    }
}

impl<O, F, N> Solver<O, QuasiNewtonState<F, N>> for QuasiNewton<F>
where
    O: CostFunction<Param = OVector<F, N>, Output = F>
        + Gradient<Param = OVector<F, N>, Gradient = OVector<F, N>>,
    F: FloatingPoint + ArgminFloat,
    N: DimName,
    DefaultAllocator: Allocator<N> + Allocator<N, N>,
{
    const NAME: &'static str = "Quasi-newton method with backtracking line search";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        state: QuasiNewtonState<F, N>,
    ) -> Result<(QuasiNewtonState<F, N>, Option<KV>), Error> {
        let x0 = state.get_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            concat!(
                "`QuasiNewton` requires an initial parameter vector. ",
                "Please provide an initial guess via `Executor`s `configure` method."
            )
        ))?;

        let cost = problem.cost(x0)?;
        if !Float::is_finite(cost) {
            return Err(MinimizerError::NonFiniteCost.into());
        }

        let grad = problem.gradient(x0)?;
        if !all_finite(grad.iter()) {
            return Err(MinimizerError::NonFiniteGradient.into());
        }

        let h0 = state
            .get_inv_hessian()
            .cloned()
            .unwrap_or_else(OMatrix::<F, N, N>::identity);

        Ok((state.cost(cost).gradient(grad).inv_hessian(h0), None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: QuasiNewtonState<F, N>,
    ) -> Result<(QuasiNewtonState<F, N>, Option<KV>), Error> {
        let x0 = state
            .get_param()
            .cloned()
            .ok_or_else(argmin_error_closure!(
                NotInitialized,
                "`QuasiNewton` requires an initial parameter vector."
            ))?;
        let f0 = state.get_cost();
        let g0 = match state.get_gradient() {
            Some(g) => g.clone(),
            None => problem.gradient(&x0)?,
        };
        let h0 = state
            .get_inv_hessian()
            .cloned()
            .unwrap_or_else(OMatrix::<F, N, N>::identity);

        // backtracking line search along the quasi-newton direction
        let step = -(&h0 * &g0);
        let norm = step.norm();
        let df0 = g0.dot(&step);

        let dt = F::from_f64_lossy(1e-1);
        let dec = F::from_f64_lossy(0.5);
        let mut t = F::one();
        let mut accepted = None;
        while t * norm >= self.step_size_tolerance {
            let x1 = &x0 + &step * t;
            let f1 = problem.cost(&x1)?;
            if !Float::is_finite(f1) || f1 - f0 >= dt * t * df0 {
                t *= dec;
            } else {
                accepted = Some((x1, f1));
                break;
            }
        }

        let (x1, f1) = match accepted {
            Some(found) => found,
            None if f0 < self.cost_tolerance => {
                // already at the floor of the cost, nothing left to descend
                return Ok((
                    state.terminate_with(TerminationReason::SolverConverged),
                    None,
                ));
            }
            None => return Err(MinimizerError::LineSearchFailed.into()),
        };

        let g1 = problem.gradient(&x1)?;
        if !all_finite(g1.iter()) {
            return Err(MinimizerError::NonFiniteGradient.into());
        }

        // BFGS update of the inverse hessian, skipped when the curvature condition fails
        let s = &step * t;
        let y = &g1 - &g0;
        let ys = y.dot(&s);
        let h1 = if ys > F::default_epsilon() {
            let hy = &h0 * &y;
            let c = (ys + y.dot(&hy)) / (ys * ys);
            OMatrix::<F, N, N>::from_fn(|i, j| {
                h0[(i, j)] + s[i] * s[j] * c - (hy[i] * s[j] + s[i] * hy[j]) / ys
            })
        } else {
            h0
        };

        Ok((
            state.param(x1).cost(f1).gradient(g1).inv_hessian(h1),
            None,
        ))
    }

    fn terminate(&mut self, state: &QuasiNewtonState<F, N>) -> TerminationStatus {
        if let Some(g) = state.get_gradient() {
            if g.norm() < self.step_size_tolerance {
                return TerminationStatus::Terminated(TerminationReason::SolverConverged);
            }

            if let Some(h) = state.get_inv_hessian() {
                if (h * g).norm() < self.step_size_tolerance {
                    return TerminationStatus::Terminated(TerminationReason::SolverConverged);
                }
            }
        }

        let cost = state.get_cost();
        let prev_cost = state.get_prev_cost();
        if Float::is_finite(prev_cost)
            && cost != prev_cost
            && Float::abs(cost - prev_cost) < self.cost_tolerance
        {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }

        TerminationStatus::NotTerminated
    }
}
