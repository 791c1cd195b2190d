pub mod minimizer_error;
pub mod minimizer_options;
pub mod quasi_newton;

pub use minimizer_error::*;
pub use minimizer_options::*;
pub use quasi_newton::*;

use argmin::core::{
    ArgminFloat, CostFunction, Executor, Gradient, State, TerminationReason,
};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OMatrix, OVector};

use crate::misc::FloatingPoint;

/// Result of a successful minimization
#[derive(Clone, Debug)]
pub struct Minimization<F: FloatingPoint, N: DimName>
where
    DefaultAllocator: Allocator<N>,
{
    param: OVector<F, N>,
    cost: F,
    iterations: u64,
}

impl<F: FloatingPoint, N: DimName> Minimization<F, N>
where
    DefaultAllocator: Allocator<N>,
{
    pub fn param(&self) -> &OVector<F, N> {
        &self.param
    }

    pub fn cost(&self) -> F {
        self.cost
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn into_param(self) -> OVector<F, N> {
        self.param
    }
}

/// Minimize `problem` from `init` with the quasi-Newton solver
/// Fails with a `MinimizerError` when the solver cannot reach a minimum.
/// # Example
/// ```
/// use argmin::core::{CostFunction, Gradient};
/// use nalgebra::Vector2;
/// use nurbs_kernel::prelude::*;
/// use approx::assert_relative_eq;
///
/// struct Bowl;
///
/// impl CostFunction for Bowl {
///     type Param = Vector2<f64>;
///     type Output = f64;
///     fn cost(&self, p: &Self::Param) -> Result<f64, anyhow::Error> {
///         Ok((p.x - 1.).powi(2) + 4. * (p.y + 2.).powi(2))
///     }
/// }
///
/// impl Gradient for Bowl {
///     type Param = Vector2<f64>;
///     type Gradient = Vector2<f64>;
///     fn gradient(&self, p: &Self::Param) -> Result<Vector2<f64>, anyhow::Error> {
///         Ok(Vector2::new(2. * (p.x - 1.), 8. * (p.y + 2.)))
///     }
/// }
///
/// let result = minimize(Bowl, Vector2::new(5., 5.), &MinimizerOptions::default()).unwrap();
/// assert_relative_eq!(result.param(), &Vector2::new(1., -2.), epsilon = 1e-6);
/// ```
pub fn minimize<O, F, N>(
    problem: O,
    init: OVector<F, N>,
    options: &MinimizerOptions<F>,
) -> anyhow::Result<Minimization<F, N>>
where
    O: CostFunction<Param = OVector<F, N>, Output = F>
        + Gradient<Param = OVector<F, N>, Gradient = OVector<F, N>>,
    F: FloatingPoint + ArgminFloat,
    N: DimName,
    DefaultAllocator: Allocator<N> + Allocator<N, N>,
{
    let solver = QuasiNewton::<F>::new()
        .with_step_size_tolerance(options.step_size_tolerance)
        .with_cost_tolerance(options.cost_tolerance);

    let res = Executor::new(problem, solver)
        .configure(|state| {
            state
                .param(init)
                .inv_hessian(OMatrix::<F, N, N>::identity())
                .max_iters(options.max_iters)
        })
        .run()?;

    let state = res.state();
    if let Some(TerminationReason::MaxItersReached) = state.get_termination_reason() {
        return Err(MinimizerError::MaxItersReached(options.max_iters).into());
    }

    let param = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No best parameter found"))?;

    Ok(Minimization {
        param,
        cost: state.get_best_cost(),
        iterations: state.get_iter(),
    })
}
