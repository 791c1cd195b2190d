pub mod curve_error;
pub mod curve_length_parameter;
pub mod degree_reduction;
pub mod nurbs_curve;
pub use curve_error::*;
pub use curve_length_parameter::*;
pub use nurbs_curve::*;

#[cfg(test)]
mod tests;
