use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, RealField};

/// Squared norm of the cross product `(p2 - p1) x (p3 - p1)`,
/// computed with the Lagrange identity so it holds in any dimension.
pub fn triangle_area_squared<T: RealField + Copy, D: DimName>(
    p1: &OPoint<T, D>,
    p2: &OPoint<T, D>,
    p3: &OPoint<T, D>,
) -> T
where
    DefaultAllocator: Allocator<D>,
{
    let p21 = p2 - p1;
    let p31 = p3 - p1;
    let d = p21.dot(&p31);
    (p21.norm_squared() * p31.norm_squared() - d * d).max(T::zero())
}

/// Check if three points lie on a line within `tolerance` (compared against the squared area)
pub fn three_points_are_flat<T: RealField + Copy, D: DimName>(
    p1: &OPoint<T, D>,
    p2: &OPoint<T, D>,
    p3: &OPoint<T, D>,
    tolerance: T,
) -> bool
where
    DefaultAllocator: Allocator<D>,
{
    triangle_area_squared(p1, p2, p3) < tolerance
}

/// Find the closest point on a segment
/// * `pt` - point to project
/// * `start` - start point of segment
/// * `end` - end point of segment
/// * `u0` - first param of segment
/// * `u1` - second param of segment
pub fn segment_closest_point<T: RealField + Copy, D: DimName>(
    pt: &OPoint<T, D>,
    start: &OPoint<T, D>,
    end: &OPoint<T, D>,
    u0: T,
    u1: T,
) -> (T, OPoint<T, D>)
where
    DefaultAllocator: Allocator<D>,
{
    let dir = end - start;
    let length = dir.norm();

    // degenerated segment
    if length < T::default_epsilon() {
        return (u0, start.clone());
    }

    let unit = dir / length;
    let along = (pt - start).dot(&unit);

    if along <= T::zero() {
        (u0, start.clone())
    } else if along >= length {
        (u1, end.clone())
    } else {
        let ratio = along / length;
        (u0 + (u1 - u0) * ratio, start + unit * along)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point2, Point3};

    use super::*;

    #[test]
    fn flat_points() {
        let a = Point3::new(0., 0., 0.);
        let b = Point3::new(1., 1., 1.);
        let c = Point3::new(2., 2., 2.);
        assert!(three_points_are_flat(&a, &b, &c, 1e-10));

        let d = Point3::new(2., 0., 0.);
        assert!(!three_points_are_flat(&a, &b, &d, 1e-10));
    }

    #[test]
    fn area_matches_planar_cross_product() {
        let a = Point2::<f64>::new(0., 0.);
        let b = Point2::new(2., 0.);
        let c = Point2::new(0., 3.);
        // |cross| = 6
        assert!((triangle_area_squared(&a, &b, &c) - 36.).abs() < 1e-12);
    }

    #[test]
    fn closest_point_on_segment() {
        let s = Point2::<f64>::new(0., 0.);
        let e = Point2::new(10., 0.);
        let (u, p) = segment_closest_point(&Point2::new(2.5, 4.), &s, &e, 0., 1.);
        assert!((u - 0.25).abs() < 1e-12);
        assert!((p - Point2::new(2.5, 0.)).norm() < 1e-12);

        let (u, _) = segment_closest_point(&Point2::new(-3., 1.), &s, &e, 0., 1.);
        assert_eq!(u, 0.);

        // degenerated segment falls back to the start
        let (u, p) = segment_closest_point(&Point2::new(1., 1.), &s, &s, 0.2, 0.4);
        assert_eq!(u, 0.2);
        assert_eq!(p, s);
    }
}
