use crate::misc::FloatingPoint;

/// Stopping criteria of the quasi-Newton minimizer
#[derive(Clone, Debug)]
pub struct MinimizerOptions<T: FloatingPoint> {
    /// The search stops when the step or the gradient gets shorter than this.
    pub step_size_tolerance: T,
    /// The search stops when the cost changes less than this between iterations.
    pub cost_tolerance: T,
    /// Maximum number of iterations, reaching it is an error.
    pub max_iters: u64,
}

impl<T: FloatingPoint> Default for MinimizerOptions<T> {
    fn default() -> Self {
        Self {
            step_size_tolerance: T::from_f64_lossy(1e-10),
            cost_tolerance: T::from_f64_lossy(1e-14),
            max_iters: 200,
        }
    }
}

impl<T: FloatingPoint> MinimizerOptions<T> {
    pub fn with_step_size_tolerance(mut self, step_size_tolerance: T) -> Self {
        self.step_size_tolerance = step_size_tolerance;
        self
    }

    pub fn with_cost_tolerance(mut self, cost_tolerance: T) -> Self {
        self.cost_tolerance = cost_tolerance;
        self
    }

    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }
}
