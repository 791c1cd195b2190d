use super::Intersection;

pub mod curve_intersection_problem;
pub mod curve_intersection_solver_options;
pub mod intersection_curve_curve;
pub mod self_intersection;

pub use curve_intersection_problem::*;
pub use curve_intersection_solver_options::*;

/// A struct representing the intersection of two curves.
pub type CurveCurveIntersection<P, T> = Intersection<P, T, T>;
