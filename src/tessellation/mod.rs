pub mod sampled_point;
pub mod tessellation_curve;

pub use sampled_point::*;
pub use tessellation_curve::MAX_SAMPLING_DEPTH;

/// A trait for tessellating a shape
pub trait Tessellation<Opt> {
    type Output;
    fn tessellate(&self, options: Opt) -> Self::Output;
}
