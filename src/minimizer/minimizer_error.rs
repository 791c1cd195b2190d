use thiserror::Error;

/// Failure modes of the quasi-Newton minimizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinimizerError {
    #[error("gradient is NaN or infinite")]
    NonFiniteGradient,
    #[error("cost is NaN or infinite")]
    NonFiniteCost,
    #[error("line search step size smaller than tolerance")]
    LineSearchFailed,
    #[error("max iterations reached ({0})")]
    MaxItersReached(u64),
}
