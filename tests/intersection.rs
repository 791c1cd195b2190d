use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Vector3};
use nurbs_kernel::prelude::*;

fn bezier(points: &[(f64, f64)]) -> NurbsCurve2D<f64> {
    let points: Vec<_> = points.iter().map(|(x, y)| Point2::new(*x, *y)).collect();
    NurbsCurve2D::try_from_points(&points, points.len() - 1, None).unwrap()
}

fn curve_a() -> NurbsCurve2D<f64> {
    bezier(&[(-5., 0.), (-2., 6.), (2., -6.), (5., 0.)])
}

fn curve_b() -> NurbsCurve2D<f64> {
    bezier(&[(-5., 0.), (-2., -3.), (2., 3.), (5., 0.)])
}

fn scenario() -> NurbsCurve2D<f64> {
    NurbsCurve2D::try_from_points(
        &[
            Point2::new(5., 5.),
            Point2::new(10., 10.),
            Point2::new(20., 15.),
            Point2::new(35., 15.),
            Point2::new(45., 10.),
            Point2::new(50., 5.),
        ],
        3,
        None,
    )
    .unwrap()
}

#[test]
fn two_s_curves_meet_three_times() {
    let a = curve_a();
    let b = curve_b();
    let intersections = a.find_intersection(&b, None).unwrap();
    assert_eq!(intersections.len(), 3);

    let expected = [
        (0., Point2::new(-5., 0.)),
        (0.5, Point2::new(0., 0.)),
        (1., Point2::new(5., 0.)),
    ];
    for (it, (t, p)) in intersections.iter().zip(expected.iter()) {
        assert_relative_eq!(it.a_parameter(), *t, epsilon = 1e-5);
        assert_relative_eq!(it.b_parameter(), *t, epsilon = 1e-5);
        assert_relative_eq!(it.a().0, *p, epsilon = 1e-5);
        assert_relative_eq!(it.b().0, *p, epsilon = 1e-5);
    }
}

#[test]
fn intersection_is_deterministic() {
    let a = curve_a();
    let b = curve_b();
    let first = a.find_intersection(&b, None).unwrap();
    let second = a.find_intersection(&b, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn cubic_crosses_a_line_twice() {
    let curve = scenario();
    let line = NurbsCurve2D::try_polyline(&[Point2::new(0., 12.), Point2::new(60., 8.)]).unwrap();
    let intersections = curve.find_intersection(&line, None).unwrap();
    assert_eq!(intersections.len(), 2);

    assert_relative_eq!(intersections[0].a_parameter(), 0.180625, epsilon = 1e-5);
    assert_relative_eq!(intersections[0].b_parameter(), 0.218802, epsilon = 1e-5);
    assert_relative_eq!(intersections[1].a_parameter(), 0.896317, epsilon = 1e-5);
    assert_relative_eq!(intersections[1].b_parameter(), 0.755571, epsilon = 1e-5);

    for it in intersections.iter() {
        assert!((it.a().0 - it.b().0).norm() < 1e-6);
    }
}

#[test]
fn disjoint_curves_do_not_intersect() {
    let a = curve_a();
    let far = bezier(&[(-5., 20.), (-2., 26.), (2., 14.), (5., 20.)]);
    assert!(a.find_intersection(&far, None).unwrap().is_empty());
}

#[test]
fn loop_has_a_single_self_intersection() {
    let looped = bezier(&[(0., 0.), (15., 10.), (-5., 10.), (10., 0.)]);
    let intersections = looped.find_self_intersections(None).unwrap();
    assert_eq!(intersections.len(), 1);

    let it = &intersections[0];
    assert_relative_eq!(it.a_parameter(), 0.172673, epsilon = 1e-5);
    assert_relative_eq!(it.b_parameter(), 0.827327, epsilon = 1e-5);
    assert_relative_eq!(it.a().0, Point2::new(5., 30. / 7.), epsilon = 1e-5);
}

#[test]
fn s_curve_does_not_cross_itself() {
    assert!(curve_a().find_self_intersections(None).unwrap().is_empty());
}

#[test]
fn curve_crosses_a_plane() {
    let curve = scenario();
    let points: Vec<_> = curve
        .dehomogenized_control_points()
        .iter()
        .map(|p| Point3::new(p.x, p.y, 0.))
        .collect();
    let spatial = NurbsCurve3D::try_from_points(&points, 3, None).unwrap();
    let plane = Plane::try_new(Vector3::y(), -12.).unwrap();

    let intersections = spatial.find_intersection(&plane, None).unwrap();
    assert_eq!(intersections.len(), 2);
    for it in intersections.iter() {
        let (point, u) = it.a();
        assert!((point.y - 12.).abs() < 1e-6);
        assert_relative_eq!(*point, spatial.point_at(*u), epsilon = 1e-12);

        let (projected, (pu, pv)) = it.b();
        assert!(plane.signed_distance(projected).abs() < 1e-12);
        let (fu, fv) = plane.frame();
        let rebuilt = plane.origin() + fu * *pu + fv * *pv;
        assert_relative_eq!(rebuilt, *projected, epsilon = 1e-9);
    }
    assert!(intersections[0].a_parameter() < intersections[1].a_parameter());
}

fn arch() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_from_points(
        &[
            Point3::new(-2., 0., 0.),
            Point3::new(0., 4., 0.),
            Point3::new(2., 0., 0.),
        ],
        2,
        None,
    )
    .unwrap()
}

#[test]
fn close_plane_crossings_are_both_found() {
    let curve = arch();
    // the apex sits at y = 2, this plane cuts it just below
    let plane = Plane::try_new(Vector3::y(), -1.9999).unwrap();
    let intersections = curve.find_intersection(&plane, None).unwrap();
    assert_eq!(intersections.len(), 2);

    let offset = (1.25e-5f64).sqrt();
    assert_relative_eq!(intersections[0].a_parameter(), 0.5 - offset, epsilon = 1e-6);
    assert_relative_eq!(intersections[1].a_parameter(), 0.5 + offset, epsilon = 1e-6);
    for it in intersections.iter() {
        assert!((it.a().0.y - 1.9999).abs() < 1e-6);
    }
}

#[test]
fn plane_touching_the_apex_is_found() {
    let curve = arch();
    let plane = Plane::try_new(Vector3::y(), -2.).unwrap();
    let intersections = curve.find_intersection(&plane, None).unwrap();
    assert_eq!(intersections.len(), 1);
    assert_relative_eq!(intersections[0].a_parameter(), 0.5, epsilon = 1e-3);
    assert_relative_eq!(intersections[0].a().0, Point3::new(0., 2., 0.), epsilon = 1e-3);
}

#[test]
fn custom_options_are_honoured() {
    let a = curve_a();
    let b = curve_b();
    let options = CurveIntersectionSolverOptions::default()
        .with_knot_domain_division(128)
        .with_minimum_distance(1e-7)
        .with_max_iters(500);
    let mut jitter = Jitter::from_seed(42);
    let intersections = a
        .find_intersection_with_jitter(&b, options, &mut jitter)
        .unwrap();
    assert_eq!(intersections.len(), 3);
}
