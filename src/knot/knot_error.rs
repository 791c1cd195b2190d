use thiserror::Error;

/// Reasons a knot vector is rejected for a given degree and control point count
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnotVectorError {
    #[error("invalid number of knots, got {actual}, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("knot at index {index} is not finite")]
    NonFinite { index: usize },
    #[error("knot at index {index} is smaller than its predecessor")]
    Decreasing { index: usize },
    #[error("knot vector must be clamped with multiplicity {required} at both ends")]
    NotClamped { required: usize },
    #[error("interior knot at index {index} exceeds the maximum multiplicity {max}")]
    ExcessiveMultiplicity { index: usize, max: usize },
    #[error("knot vector has an empty domain")]
    EmptyDomain,
}
