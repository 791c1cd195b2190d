use crate::misc::FloatingPoint;

/// Numeric thresholds shared across the kernel
///
/// `EPSILON` is used for knot comparisons and parameter equality,
/// the `*_TOLERANCE` pair bounds user supplied geometric tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance;

impl Tolerance {
    pub const EPSILON: f64 = 1e-10;
    pub const MIN_TOLERANCE: f64 = 1e-6;
    pub const MAX_TOLERANCE: f64 = 1e-3;

    pub fn epsilon<T: FloatingPoint>() -> T {
        T::from_f64_lossy(Self::EPSILON)
    }

    pub fn min_tolerance<T: FloatingPoint>() -> T {
        T::from_f64_lossy(Self::MIN_TOLERANCE)
    }

    pub fn max_tolerance<T: FloatingPoint>() -> T {
        T::from_f64_lossy(Self::MAX_TOLERANCE)
    }

    /// Check if two scalars are equal within `EPSILON`
    pub fn equals<T: FloatingPoint>(a: T, b: T) -> bool {
        (a - b).abs() < Self::epsilon()
    }
}
