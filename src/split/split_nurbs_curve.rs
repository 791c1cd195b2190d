use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{
    curve::NurbsCurve,
    knot::KnotVector,
    misc::{FloatingPoint, Tolerance},
};

use super::Split;

impl<T: FloatingPoint, D: DimName> Split for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Option = T;

    /// Split the curve into two curves before and after the parameter
    /// Both halves end (or start) at `u` with multiplicity `degree + 1`.
    /// A parameter within epsilon of an existing knot snaps to that knot.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(3., 2.), Point2::new(4., 0.)],
    ///     3,
    ///     None,
    /// ).unwrap();
    /// let (left, right) = curve.try_split(0.4).unwrap();
    /// assert_eq!(left.knots_domain().1, 0.4);
    /// assert_eq!(right.knots_domain().0, 0.4);
    /// assert_relative_eq!(left.point_at(0.4), curve.point_at(0.4), epsilon = 1e-12);
    /// assert_relative_eq!(right.point_at(0.4), curve.point_at(0.4), epsilon = 1e-12);
    /// assert!(curve.try_split(0.).is_err());
    /// ```
    fn try_split(&self, u: T) -> anyhow::Result<(Self, Self)> {
        let eps = Tolerance::epsilon();
        let (start, end) = self.knots_domain();
        anyhow::ensure!(
            u > start + eps && u < end - eps,
            "Split parameter must lie strictly inside the domain"
        );

        let degree = self.degree();
        let u = self
            .knots()
            .iter()
            .find(|k| (**k - u).abs() <= eps)
            .copied()
            .unwrap_or(u);
        let existing = self.knots().multiplicity_of(u);
        let refined = self.try_insert_knot(u, (degree + 1).saturating_sub(existing))?;

        let index = refined
            .knots()
            .iter()
            .position(|k| (*k - u).abs() <= eps)
            .ok_or_else(|| anyhow::anyhow!("Split knot not found after refinement"))?;

        let knots = refined.knots().as_slice();
        let knots0 = knots[..=(index + degree)].to_vec();
        let knots1 = knots[index..].to_vec();
        let cpts0 = refined.control_points()[..index].to_vec();
        let cpts1 = refined.control_points()[index..].to_vec();

        Ok((
            Self::new_unchecked(degree, cpts0, KnotVector::new(knots0)),
            Self::new_unchecked(degree, cpts1, KnotVector::new(knots1)),
        ))
    }
}
