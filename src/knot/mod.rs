pub mod knot_error;
pub mod knot_multiplicity;
pub mod knot_vector;
pub use knot_error::*;
pub use knot_multiplicity::*;
pub use knot_vector::*;
