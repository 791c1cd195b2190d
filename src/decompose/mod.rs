pub mod decompose_nurbs_curve;

/// Decompose a curve into a set of curves
pub trait Decompose {
    type Output;
    fn try_decompose(&self) -> anyhow::Result<Self::Output>;
}
