pub mod curve_curve;
pub mod curve_plane;
pub mod intersection;

pub use curve_curve::*;
pub use curve_plane::*;
pub use intersection::*;

/// Intersection between two objects trait
pub trait Intersects<'a, T> {
    type Output;
    type Option;

    fn find_intersection(&'a self, other: T, option: Self::Option) -> Self::Output;
}
