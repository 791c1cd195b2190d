use std::cmp::Ordering;

use argmin::core::ArgminFloat;
use itertools::Itertools;
use nalgebra::{Point3, RealField, Vector1};

use crate::{
    curve::NurbsCurve3D,
    intersects::curve_curve::intersection_curve_curve::clamp_to_domain,
    minimizer::minimize,
    misc::{FloatingPoint, Jitter, Plane, Tolerance},
    prelude::{
        BoundingBoxTree, CurveBoundingBoxTree, CurveIntersectionSolverOptions, Intersects,
        MAX_TRAVERSAL_PAIRS,
    },
};

use super::{CurvePlaneIntersection, CurvePlaneIntersectionProblem};

impl<'a, T> Intersects<'a, &'a Plane<T>> for NurbsCurve3D<T>
where
    T: FloatingPoint + ArgminFloat,
{
    type Output = anyhow::Result<Vec<CurvePlaneIntersection<Point3<T>, T>>>;
    type Option = Option<CurveIntersectionSolverOptions<T>>;

    /// Find the points where the curve crosses the plane, sorted by the curve parameter
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    /// use approx::assert_relative_eq;
    ///
    /// let curve = NurbsCurve3D::try_from_points(
    ///     &[
    ///         Point3::new(0., 0., -1.),
    ///         Point3::new(1., 0., 3.),
    ///         Point3::new(2., 0., -3.),
    ///         Point3::new(3., 0., 1.),
    ///     ],
    ///     3,
    ///     None,
    /// ).unwrap();
    /// let plane = Plane::try_new(Vector3::z(), 0.).unwrap();
    /// let intersections = curve.find_intersection(&plane, None).unwrap();
    /// assert_eq!(intersections.len(), 3);
    /// for it in intersections.iter() {
    ///     assert_relative_eq!(it.a().0.z, 0., epsilon = 1e-6);
    /// }
    /// ```
    fn find_intersection(&'a self, plane: &'a Plane<T>, option: Self::Option) -> Self::Output {
        let mut jitter = Jitter::seeded();
        self.find_plane_intersection_with_jitter(plane, option.unwrap_or_default(), &mut jitter)
    }
}

impl<T> NurbsCurve3D<T>
where
    T: FloatingPoint + ArgminFloat,
{
    /// Find the points where the curve crosses the plane, drawing split points from `jitter`
    pub fn find_plane_intersection_with_jitter(
        &self,
        plane: &Plane<T>,
        options: CurveIntersectionSolverOptions<T>,
        jitter: &mut Jitter,
    ) -> anyhow::Result<Vec<CurvePlaneIntersection<Point3<T>, T>>> {
        let tol = options.minimum_distance;
        let root = CurveBoundingBoxTree::new(
            self,
            Some(options.knot_tolerance(self.knots_domain_interval())),
        );

        // collect leaves whose bounding box straddles the plane
        let mut nodes = vec![root];
        let mut leaves = vec![];
        while let Some(node) = nodes.pop() {
            let distances = node
                .bounding_box()
                .corners()
                .iter()
                .map(|c| plane.signed_distance(c))
                .collect_vec();
            let min = distances.iter().fold(distances[0], |a, b| RealField::min(a, *b));
            let max = distances.iter().fold(distances[0], |a, b| RealField::max(a, *b));
            if min > tol || max < -tol {
                continue;
            }

            if node.is_dividable() {
                let (n0, n1) = node.try_divide(jitter)?;
                nodes.push(n1);
                nodes.push(n0);
                anyhow::ensure!(
                    nodes.len() <= MAX_TRAVERSAL_PAIRS,
                    "Bounding box traversal exceeded {} pending nodes",
                    MAX_TRAVERSAL_PAIRS
                );
            } else {
                leaves.push(node.domain());
            }
        }
        log::debug!("curve plane traversal found {} leaves", leaves.len());

        let domain = self.knots_domain();
        let signed = |u: T| plane.signed_distance(&self.point_at(u));
        let intersections = leaves
            .into_iter()
            .flat_map(|(start, end)| leaf_seeds(&signed, start, end, domain))
            .filter_map(|seed| {
                let u = self.refine_plane_root(plane, seed, &options, domain)?;
                let point = self.point_at(u);
                let projected = plane.project(&point);
                let uv = plane.plane_coordinates(&projected);
                Some(CurvePlaneIntersection::new((point, u), (projected, uv)))
            })
            .collect_vec();

        let found = intersections.len();
        let window = tol * T::from_f64_lossy(5.0);
        let offset = |it: &CurvePlaneIntersection<Point3<T>, T>| (&it.a().0 - &it.b().0).norm_squared();
        let merged = intersections
            .into_iter()
            .sorted_by(|x, y| {
                x.a_parameter()
                    .partial_cmp(&y.a_parameter())
                    .unwrap_or(Ordering::Equal)
            })
            .coalesce(|x, y| {
                let du = y.a_parameter() - x.a_parameter();
                if du < window {
                    if offset(&y) < offset(&x) {
                        Ok(y)
                    } else {
                        Ok(x)
                    }
                } else {
                    Err((x, y))
                }
            })
            .collect_vec();
        log::debug!(
            "curve plane intersection accepted {} candidates, {} after merging",
            found,
            merged.len()
        );

        Ok(merged)
    }

    /// Polish a seed with the minimizer, falling back to the seed itself when the run fails
    /// or wanders off. Returns the parameter only if it lies on the plane within the tolerance.
    fn refine_plane_root(
        &self,
        plane: &Plane<T>,
        seed: T,
        options: &CurveIntersectionSolverOptions<T>,
        domain: (T, T),
    ) -> Option<T> {
        let tol = options.minimum_distance;
        let window = tol * T::from_f64_lossy(5.0);
        let problem = CurvePlaneIntersectionProblem::new(self, plane);
        let mut candidates = Vec::with_capacity(2);
        match minimize(problem, Vector1::new(seed), &options.minimizer_options()) {
            Ok(res) => {
                let u = res.into_param()[0];
                if u - seed < window && seed - u < window {
                    candidates.push(u);
                }
            }
            Err(e) => log::trace!("curve plane candidate {:?} failed: {}", seed, e),
        }
        candidates.push(seed);

        candidates
            .into_iter()
            .filter_map(|u| clamp_to_domain(u, domain, tol))
            .find(|u| {
                let d = plane.signed_distance(&self.point_at(*u));
                d < tol && -d < tol
            })
    }
}

/// Signed distance samples taken across a leaf when looking for roots
const LEAF_SAMPLES: usize = 8;

/// Iteration cap of the one dimensional bracketing searches
const MAX_BRACKET_ITERS: usize = 128;

/// Starting parameters for the roots of `signed` inside `[start, end]`
/// Every sign change between neighbouring samples is bisected down to a root.
/// A sample whose distance is a local minimum in magnitude without a sign change around it
/// is a possible tangent touch, its neighbourhood is searched for the smallest distance.
/// A touch found on the edge of that neighbourhood belongs to the adjacent leaf and is dropped,
/// unless it lies on the plane or on an end of the curve `domain`.
fn leaf_seeds<T: FloatingPoint>(
    signed: &impl Fn(T) -> T,
    start: T,
    end: T,
    domain: (T, T),
) -> Vec<T> {
    let step = (end - start) / T::from_count(LEAF_SAMPLES);
    let samples = (0..=LEAF_SAMPLES)
        .map(|i| {
            let u = if i == LEAF_SAMPLES {
                end
            } else {
                start + step * T::from_count(i)
            };
            (u, signed(u))
        })
        .collect_vec();

    let zero = T::zero();
    let eps = Tolerance::epsilon();
    let crosses = |a: T, b: T| (a < zero && b > zero) || (a > zero && b < zero);
    let near = |a: T, b: T| a - b < eps && b - a < eps;

    let mut seeds = vec![];
    for (i, (u, d)) in samples.iter().enumerate() {
        if *d == zero {
            seeds.push(*u);
            continue;
        }
        if let Some((u1, d1)) = samples.get(i + 1) {
            if crosses(*d, *d1) {
                seeds.push(bisect_sign_change(signed, *u, *u1, *d));
            }
        }

        let left = i.checked_sub(1).map(|j| samples[j]);
        let right = samples.get(i + 1).copied();
        let touches = [left, right].iter().flatten().all(|(_, dn)| {
            !crosses(*d, *dn) && d.abs() <= dn.abs()
        });
        if touches {
            let lo = left.map_or(*u, |(ul, _)| ul);
            let hi = right.map_or(*u, |(ur, _)| ur);
            let touch = golden_section_minimum(|x| signed(x).abs(), lo, hi);
            let on_edge = near(touch, lo) || near(touch, hi);
            let on_end = near(touch, domain.0) || near(touch, domain.1);
            if !on_edge || on_end || signed(touch).abs() <= eps {
                seeds.push(touch);
            }
        }
    }
    seeds
}

/// Shrink `[lo, hi]`, across which `signed` changes sign, onto the root
fn bisect_sign_change<T: FloatingPoint>(signed: &impl Fn(T) -> T, lo: T, hi: T, d_lo: T) -> T {
    let (mut lo, mut hi, mut d_lo) = (lo, hi, d_lo);
    let eps = Tolerance::epsilon();
    let half = T::from_f64_lossy(0.5);
    let zero = T::zero();
    for _ in 0..MAX_BRACKET_ITERS {
        if hi - lo < eps {
            break;
        }
        let mid = (lo + hi) * half;
        let d = signed(mid);
        if d == zero {
            return mid;
        }
        if (d < zero) == (d_lo < zero) {
            lo = mid;
            d_lo = d;
        } else {
            hi = mid;
        }
    }
    (lo + hi) * half
}

/// Golden section search for the minimum of a unimodal `f` on `[lo, hi]`
fn golden_section_minimum<T: FloatingPoint>(f: impl Fn(T) -> T, lo: T, hi: T) -> T {
    let ratio = T::from_f64_lossy(0.618_033_988_749_895);
    let eps = Tolerance::epsilon();
    let half = T::from_f64_lossy(0.5);
    let (mut a, mut b) = (lo, hi);
    let mut c = b - (b - a) * ratio;
    let mut d = a + (b - a) * ratio;
    let (mut fc, mut fd) = (f(c), f(d));
    for _ in 0..MAX_BRACKET_ITERS {
        if b - a < eps {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - (b - a) * ratio;
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + (b - a) * ratio;
            fd = f(d);
        }
    }
    (a + b) * half
}
