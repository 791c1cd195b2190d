use std::cmp::Ordering;

use argmin::core::ArgminFloat;
use itertools::Itertools;
use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, Vector2, U1,
};

use crate::{
    curve::NurbsCurve,
    minimizer::minimize,
    misc::{FloatingPoint, Jitter},
    prelude::{BoundingBoxTraversal, BoundingBoxTree, CurveBoundingBoxTree, Intersects},
};

use super::{CurveCurveIntersection, CurveIntersectionProblem, CurveIntersectionSolverOptions};

impl<'a, T, D> Intersects<'a, &'a NurbsCurve<T, D>> for NurbsCurve<T, D>
where
    T: FloatingPoint + ArgminFloat,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Output = anyhow::Result<Vec<CurveCurveIntersection<OPoint<T, DimNameDiff<D, U1>>, T>>>;
    type Option = Option<CurveIntersectionSolverOptions<T>>;

    /// Find the intersection points with another curve
    /// Candidate leaf pairs from the bounding box traversal are refined by the quasi-Newton minimizer,
    /// results are sorted by the parameter on `self`.
    /// * `other` - The other curve to intersect with
    /// * `options` - Hyperparameters for the intersection solver
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let arc = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(-2., 0.), Point2::new(0., 4.), Point2::new(2., 0.)],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let line = NurbsCurve2D::try_polyline(&[Point2::new(-3., 1.), Point2::new(3., 1.)]).unwrap();
    ///
    /// let intersections = arc.find_intersection(&line, None).unwrap();
    /// assert_eq!(intersections.len(), 2);
    /// for it in intersections.iter() {
    ///     assert_relative_eq!(it.a().0.y, 1., epsilon = 1e-6);
    ///     assert_relative_eq!(it.a().0, it.b().0, epsilon = 1e-6);
    /// }
    /// ```
    fn find_intersection(&'a self, other: &'a NurbsCurve<T, D>, option: Self::Option) -> Self::Output {
        let mut jitter = Jitter::seeded();
        self.find_intersection_with_jitter(other, option.unwrap_or_default(), &mut jitter)
    }
}

impl<T, D> NurbsCurve<T, D>
where
    T: FloatingPoint + ArgminFloat,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Find the intersection points with another curve, drawing split points from `jitter`
    pub fn find_intersection_with_jitter(
        &self,
        other: &Self,
        options: CurveIntersectionSolverOptions<T>,
        jitter: &mut Jitter,
    ) -> anyhow::Result<Vec<CurveCurveIntersection<OPoint<T, DimNameDiff<D, U1>>, T>>> {
        let ta = CurveBoundingBoxTree::new(
            self,
            Some(options.knot_tolerance(self.knots_domain_interval())),
        );
        let tb = CurveBoundingBoxTree::new(
            other,
            Some(options.knot_tolerance(other.knots_domain_interval())),
        );

        let traversed = BoundingBoxTraversal::try_traverse(ta, tb, jitter)?;

        let intersections = traversed
            .into_pairs_iter()
            .filter_map(|(a, b)| {
                let init = Vector2::new(a.domain().0, b.domain().0);
                solve_curve_pair(self, other, init, &options)
            })
            .collect_vec();

        let found = intersections.len();
        let merged = merge_intersections(intersections, options.minimum_distance);
        log::debug!(
            "curve intersection accepted {} candidates, {} after merging",
            found,
            merged.len()
        );

        Ok(merged)
    }
}

/// Refine a candidate parameter pair and accept it when both points meet within the minimum distance
pub(crate) fn solve_curve_pair<T, D>(
    a: &NurbsCurve<T, D>,
    b: &NurbsCurve<T, D>,
    init: Vector2<T>,
    options: &CurveIntersectionSolverOptions<T>,
) -> Option<CurveCurveIntersection<OPoint<T, DimNameDiff<D, U1>>, T>>
where
    T: FloatingPoint + ArgminFloat,
    D: DimName + DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let problem = CurveIntersectionProblem::new(a, b);
    let param = match minimize(problem, init, &options.minimizer_options()) {
        Ok(res) => {
            log::trace!(
                "curve intersection candidate {:?} settled after {} iterations",
                init,
                res.iterations()
            );
            res.into_param()
        }
        Err(e) => {
            log::trace!("curve intersection candidate {:?} failed: {}", init, e);
            return None;
        }
    };

    let tol = options.minimum_distance;
    let s = clamp_to_domain(param[0], a.knots_domain(), tol)?;
    let t = clamp_to_domain(param[1], b.knots_domain(), tol)?;

    let p0 = a.point_at(s);
    let p1 = b.point_at(t);
    if (&p0 - &p1).norm() < tol {
        Some(CurveCurveIntersection::new((p0, s), (p1, t)))
    } else {
        log::trace!("curve intersection candidate {:?} did not converge to a crossing", init);
        None
    }
}

/// Clamp the parameter into the domain if it lies within `tolerance` of it
pub(crate) fn clamp_to_domain<T: FloatingPoint>(u: T, domain: (T, T), tolerance: T) -> Option<T> {
    let (min, max) = domain;
    if u < min - tolerance || u > max + tolerance {
        None
    } else {
        Some(u.max(min).min(max))
    }
}

/// Sort intersections by the first parameter and merge the ones whose parameters
/// are both closer than `5 * tolerance`, keeping the closest pair of points
pub(crate) fn merge_intersections<T, D>(
    intersections: Vec<CurveCurveIntersection<OPoint<T, D>, T>>,
    tolerance: T,
) -> Vec<CurveCurveIntersection<OPoint<T, D>, T>>
where
    T: FloatingPoint,
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    let window = tolerance * T::from_f64_lossy(5.0);
    let distance = |it: &CurveCurveIntersection<OPoint<T, D>, T>| (&it.a().0 - &it.b().0).norm_squared();

    let sorted = intersections.into_iter().sorted_by(|x, y| {
        x.a_parameter()
            .partial_cmp(&y.a_parameter())
            .unwrap_or(Ordering::Equal)
    });

    let mut merged: Vec<CurveCurveIntersection<OPoint<T, D>, T>> = vec![];
    for it in sorted {
        let (a, b) = (it.a_parameter(), it.b_parameter());
        // kept records are sorted by `a`, only the tail within the window can collide
        let duplicate = merged
            .iter()
            .rev()
            .take_while(|kept| a - kept.a_parameter() < window)
            .position(|kept| (kept.b_parameter() - b).abs() < window)
            .map(|offset| merged.len() - 1 - offset);
        match duplicate {
            Some(index) => {
                if distance(&it) < distance(&merged[index]) {
                    merged[index] = it;
                }
            }
            None => merged.push(it),
        }
    }
    merged
}
