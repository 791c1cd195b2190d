use argmin::core::{
    ArgminFloat, CostFunction, Error, Gradient, Hessian, IterState, Problem, Solver, State,
    TerminationReason, TerminationStatus, KV,
};

type ScalarState<F> = IterState<F, F, (), F, (), F>;

/// One dimensional Newton iteration whose parameter never leaves `domain`
/// A flat or non finite second derivative ends the iteration at the current parameter.
#[derive(Clone, Copy, Debug)]
pub struct ClampedNewton<F> {
    domain: (F, F),
    tolerance: F,
}

impl<F: ArgminFloat> ClampedNewton<F> {
    pub fn new(domain: (F, F)) -> Self {
        Self {
            domain,
            tolerance: F::epsilon(),
        }
    }

    /// Stop once consecutive parameters are closer than `tolerance`
    pub fn with_tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn clamp(&self, u: F) -> F {
        let (min, max) = self.domain;
        if u < min {
            min
        } else if u > max {
            max
        } else {
            u
        }
    }
}

impl<O, F> Solver<O, ScalarState<F>> for ClampedNewton<F>
where
    O: CostFunction<Param = F, Output = F>
        + Gradient<Param = F, Gradient = F>
        + Hessian<Param = F, Hessian = F>,
    F: ArgminFloat,
{
    const NAME: &'static str = "Clamped Newton";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        mut state: ScalarState<F>,
    ) -> Result<(ScalarState<F>, Option<KV>), Error> {
        let initial = *state
            .get_param()
            .ok_or_else(|| anyhow::anyhow!("ClampedNewton requires an initial parameter"))?;
        let param = self.clamp(initial);
        if param != initial {
            state = state.param(param);
        }
        let cost = problem.cost(&param)?;
        Ok((state.cost(cost), None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: ScalarState<F>,
    ) -> Result<(ScalarState<F>, Option<KV>), Error> {
        let param = *state
            .get_param()
            .ok_or_else(|| anyhow::anyhow!("ClampedNewton requires an initial parameter"))?;

        let gradient = problem.gradient(&param)?;
        let hessian = problem.hessian(&param)?;
        if !hessian.is_finite() || hessian.abs() < F::epsilon() || !gradient.is_finite() {
            return Ok((
                state.terminate_with(TerminationReason::SolverConverged),
                None,
            ));
        }

        let next = self.clamp(param - gradient / hessian);
        let cost = problem.cost(&next)?;
        Ok((state.param(next).cost(cost), None))
    }

    fn terminate(&mut self, state: &ScalarState<F>) -> TerminationStatus {
        match (state.get_param(), state.get_prev_param()) {
            (Some(current), Some(prev)) if (*current - *prev).abs() < self.tolerance => {
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use argmin::core::{CostFunction, Executor, Gradient, Hessian, State};

    use super::ClampedNewton;

    /// (u - 3)^2
    struct Shifted;

    impl CostFunction for Shifted {
        type Param = f64;
        type Output = f64;
        fn cost(&self, u: &f64) -> Result<f64, anyhow::Error> {
            Ok((u - 3.).powi(2))
        }
    }

    impl Gradient for Shifted {
        type Param = f64;
        type Gradient = f64;
        fn gradient(&self, u: &f64) -> Result<f64, anyhow::Error> {
            Ok(2. * (u - 3.))
        }
    }

    impl Hessian for Shifted {
        type Param = f64;
        type Hessian = f64;
        fn hessian(&self, _u: &f64) -> Result<f64, anyhow::Error> {
            Ok(2.)
        }
    }

    #[test]
    fn converges_inside_domain() {
        let res = Executor::new(Shifted, ClampedNewton::new((0., 10.)))
            .configure(|state| state.param(8.).max_iters(10))
            .run()
            .unwrap();
        assert_relative_eq!(*res.state().get_best_param().unwrap(), 3.);
    }

    #[test]
    fn stops_at_domain_end() {
        let res = Executor::new(Shifted, ClampedNewton::new((0., 1.)))
            .configure(|state| state.param(0.5).max_iters(10))
            .run()
            .unwrap();
        assert_relative_eq!(*res.state().get_best_param().unwrap(), 1.);
    }
}
