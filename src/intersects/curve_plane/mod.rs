use super::Intersection;

pub mod curve_plane_intersection_problem;
pub mod intersection_curve_plane;

pub use curve_plane_intersection_problem::*;

/// A struct representing the intersection of a curve & a plane.
/// `a` holds the curve point and parameter, `b` the projected point and its `(u, v)` plane coordinates.
pub type CurvePlaneIntersection<P, T> = Intersection<P, T, (T, T)>;
