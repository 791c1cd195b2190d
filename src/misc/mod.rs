pub mod binomial;
pub mod floating_point;
pub mod jitter;
pub mod plane;
pub mod tolerance;
pub mod trigonometry;

pub use binomial::*;
pub use floating_point::*;
pub use jitter::*;
pub use plane::*;
pub use tolerance::*;
pub use trigonometry::*;
