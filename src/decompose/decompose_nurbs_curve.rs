use itertools::Itertools;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{curve::NurbsCurve, knot::KnotVector, misc::FloatingPoint, prelude::Decompose};

impl<T: FloatingPoint, D: DimName> Decompose for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Output = Vec<NurbsCurve<T, D>>;

    /// Decompose the curve into a set of Bezier segments of the same degree
    /// Every distinct knot is raised to multiplicity `degree + 1` in a single refinement,
    /// then the control points are sliced into `degree + 1` sized windows.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[
    ///         Point2::new(0., 0.),
    ///         Point2::new(1., 2.),
    ///         Point2::new(3., 2.),
    ///         Point2::new(4., 0.),
    ///         Point2::new(5., 1.),
    ///     ],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let segments = curve.try_decompose().unwrap();
    /// assert_eq!(segments.len(), 3);
    /// assert!(segments.iter().all(|s| s.control_points().len() == 3));
    /// ```
    fn try_decompose(&self) -> anyhow::Result<Self::Output> {
        anyhow::ensure!(
            self.is_clamped(),
            "Curve must be clamped to decompose into Bezier segments"
        );

        let req_mult = self.degree() + 1;
        let knots_to_insert = self
            .knots()
            .multiplicity()
            .iter()
            .filter(|m| m.multiplicity() < req_mult)
            .flat_map(|m| std::iter::repeat_n(*m.knot(), req_mult - m.multiplicity()))
            .collect_vec();
        let refined = self.try_refine_knot(knots_to_insert)?;

        let div = refined.knots().len() / req_mult - 1;
        if div <= 1 {
            return Ok(vec![refined]);
        }

        let knot_length = req_mult * 2;
        let segments = (0..div)
            .map(|i| {
                let start = i * req_mult;
                let end = start + knot_length;
                let knots = refined.knots().as_slice()[start..end].to_vec();
                let control_points = refined.control_points()[start..(start + req_mult)].to_vec();
                NurbsCurve::new_unchecked(refined.degree(), control_points, KnotVector::new(knots))
            })
            .collect_vec();
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::prelude::*;

    #[test]
    fn segments_reproduce_the_curve() {
        let curve = NurbsCurve3D::try_from_points(
            &[
                Point3::new(0., 0., 0.),
                Point3::new(1., 2., 1.),
                Point3::new(3., 2., -1.),
                Point3::new(4., 0., 0.5),
                Point3::new(5., 1., 2.),
                Point3::new(7., -1., 0.),
            ],
            3,
            Some(&[1., 2., 0.5, 1., 3., 1.]),
        )
        .unwrap();
        let segments = curve.try_decompose().unwrap();
        assert_eq!(segments.len(), 3);
        for s in segments.iter() {
            assert_eq!(s.control_points().len(), 4);
            assert!(s.is_clamped());
            let (a, b) = s.knots_domain();
            assert_relative_eq!(s.point_at(a), curve.point_at(a), epsilon = 1e-10);
            assert_relative_eq!(s.point_at(b), curve.point_at(b), epsilon = 1e-10);
            let mid = (a + b) / 2.;
            assert_relative_eq!(s.point_at(mid), curve.point_at(mid), epsilon = 1e-10);
        }
        // consecutive segments share their boundary points
        for w in segments.windows(2) {
            let p0 = w[0].control_points().last().unwrap();
            let p1 = w[1].control_points().first().unwrap();
            assert_relative_eq!(p0, p1, epsilon = 1e-10);
        }
    }

    #[test]
    fn bezier_curve_is_its_own_segment() {
        let curve = NurbsCurve3D::try_from_points(
            &[
                Point3::new(0., 0., 0.),
                Point3::new(1., 2., 1.),
                Point3::new(3., 2., -1.),
            ],
            2,
            None,
        )
        .unwrap();
        let segments = curve.try_decompose().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], curve);
    }
}
