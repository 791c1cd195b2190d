use argmin::core::ArgminFloat;
use itertools::Itertools;
use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, Vector2, U1,
};

use crate::{
    curve::NurbsCurve,
    misc::{FloatingPoint, Jitter},
    prelude::{BoundingBoxTraversal, BoundingBoxTree, CurveBoundingBoxTree},
};

use super::{
    intersection_curve_curve::{merge_intersections, solve_curve_pair},
    CurveCurveIntersection, CurveIntersectionSolverOptions,
};

impl<T, D> NurbsCurve<T, D>
where
    T: FloatingPoint + ArgminFloat,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Find the points where the curve crosses itself
    /// Each result holds the smaller parameter in `a` and the larger one in `b`.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let looped = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(15., 10.), Point2::new(-5., 10.), Point2::new(10., 0.)],
    ///     3,
    ///     None,
    /// ).unwrap();
    /// let intersections = looped.find_self_intersections(None).unwrap();
    /// assert_eq!(intersections.len(), 1);
    /// assert_relative_eq!(intersections[0].a().0, Point2::new(5., 30. / 7.), epsilon = 1e-5);
    /// ```
    pub fn find_self_intersections(
        &self,
        options: Option<CurveIntersectionSolverOptions<T>>,
    ) -> anyhow::Result<Vec<CurveCurveIntersection<OPoint<T, DimNameDiff<D, U1>>, T>>> {
        let mut jitter = Jitter::seeded();
        self.find_self_intersections_with_jitter(options.unwrap_or_default(), &mut jitter)
    }

    /// Find the points where the curve crosses itself, drawing split points from `jitter`
    pub fn find_self_intersections_with_jitter(
        &self,
        options: CurveIntersectionSolverOptions<T>,
        jitter: &mut Jitter,
    ) -> anyhow::Result<Vec<CurveCurveIntersection<OPoint<T, DimNameDiff<D, U1>>, T>>> {
        let knot_tolerance = options.knot_tolerance(self.knots_domain_interval());
        let tree = CurveBoundingBoxTree::new(self, Some(knot_tolerance));
        let traversed = BoundingBoxTraversal::try_traverse_self(tree, jitter)?;

        let intersections = traversed
            .into_pairs_iter()
            .filter_map(|(a, b)| {
                let init = Vector2::new(a.domain().0, b.domain().0);
                let it = solve_curve_pair(self, self, init, &options)?;
                let (pa, pb) = it.as_tuple();
                // parameters converging onto each other are the trivial solution
                let gap = pb.1 - pa.1;
                if gap < knot_tolerance && -gap < knot_tolerance {
                    return None;
                }
                Some(if pa.1 < pb.1 {
                    CurveCurveIntersection::new(pa, pb)
                } else {
                    CurveCurveIntersection::new(pb, pa)
                })
            })
            .collect_vec();

        let found = intersections.len();
        let merged = merge_intersections(intersections, options.minimum_distance);
        log::debug!(
            "self intersection accepted {} candidates, {} after merging",
            found,
            merged.len()
        );

        Ok(merged)
    }
}
