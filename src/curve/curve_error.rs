use thiserror::Error;

use crate::knot::KnotVectorError;

/// Failures raised while constructing or modifying a curve that callers may want to match on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("degree must be at least 1")]
    InvalidDegree,
    #[error("too few control points for degree {degree}, got {actual}")]
    TooFewControlPoints { degree: usize, actual: usize },
    #[error("invalid knot vector: {0}")]
    InvalidKnotVector(#[from] KnotVectorError),
    #[error("control point {index} is not finite")]
    NonFiniteControlPoint { index: usize },
    #[error("control point {index} has a non-positive weight")]
    InvalidWeight { index: usize },
    #[error("curve is not degree reducible, error {error} at knot index {index} exceeds tolerance {tolerance}")]
    NotDegreeReducible {
        index: usize,
        error: f64,
        tolerance: f64,
    },
}
