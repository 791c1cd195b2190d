#![allow(clippy::needless_range_loop)]

mod bounding_box;
mod closest_parameter;
mod curve;
mod decompose;
mod intersects;
mod knot;
mod minimizer;
mod misc;
mod split;
mod tessellation;

pub mod prelude {
    pub use crate::bounding_box::*;
    pub use crate::closest_parameter::*;
    pub use crate::curve::*;
    pub use crate::decompose::*;
    pub use crate::intersects::*;
    pub use crate::knot::*;
    pub use crate::minimizer::*;
    pub use crate::misc::*;
    pub use crate::split::*;
    pub use crate::tessellation::*;
}
