use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{Point2, Point3, Point4};

use crate::prelude::*;

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

fn rational() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_from_points(
        &[
            Point3::new(0., 0., 0.),
            Point3::new(1., 2., 1.),
            Point3::new(3., 2., -1.),
            Point3::new(4., 0., 0.5),
            Point3::new(5., 1., 2.),
            Point3::new(7., -1., 0.),
            Point3::new(8., 0., 1.),
        ],
        3,
        Some(&[1., 2., 0.5, 1., 3., 1., 1.]),
    )
    .unwrap()
}

#[test]
fn scenario_knots_are_uniform() {
    let curve = scenario();
    assert_eq!(
        curve.knots().to_vec(),
        vec![0., 0., 0., 0., 1. / 3., 2. / 3., 1., 1., 1., 1.]
    );
    assert_eq!(curve.knots_domain(), (0., 1.));
    assert_relative_eq!(curve.point_at(0.), Point2::new(5., 5.));
    assert_relative_eq!(curve.point_at(1.), Point2::new(50., 5.));
}

#[test]
fn divide_by_count_into_seven_segments() {
    let curve = scenario();
    let length = curve.try_length().unwrap();
    assert_abs_diff_eq!(length, 50.334675, epsilon = 1e-5);

    let divided = curve.try_divide_by_count(7).unwrap();
    let expected = [
        0., 0.122941, 0.265156, 0.420293, 0.579707, 0.734844, 0.877059, 1.,
    ];
    assert_eq!(divided.len(), expected.len());
    for (i, (d, e)) in divided.iter().zip(expected.iter()).enumerate() {
        assert_abs_diff_eq!(d.parameter(), *e, epsilon = 1e-5);
        assert_abs_diff_eq!(d.length(), length * i as f64 / 7., epsilon = 1e-5);
    }
}

#[test]
fn length_at_and_parameter_at_length_agree() {
    let curve = scenario();
    for t in [0.1, 0.4, 0.5, 0.95] {
        let l = curve.try_length_at(t).unwrap();
        let u = curve.try_parameter_at_length(l, 1e-10).unwrap();
        assert_abs_diff_eq!(u, t, epsilon = 1e-6);
    }
    assert_abs_diff_eq!(curve.try_length_at(0.).unwrap(), 0.);
    assert_abs_diff_eq!(
        curve.try_length_at(1.).unwrap(),
        curve.try_length().unwrap(),
        epsilon = 1e-10
    );
    assert!(curve.try_parameter_at_length(100., 1e-6).is_err());
}

#[test]
fn refinement_keeps_the_shape() {
    let curve = rational();
    let knots = vec![0.1, 0.25, 0.25, 0.5, 0.9];
    let refined = curve.try_refine_knot(knots.clone()).unwrap();
    assert_eq!(refined.knots().len(), curve.knots().len() + knots.len());
    assert_eq!(
        refined.control_points().len(),
        curve.control_points().len() + knots.len()
    );
    for i in 0..=40 {
        let t = i as f64 / 40.;
        assert_relative_eq!(refined.point_at(t), curve.point_at(t), epsilon = 1e-10);
    }
}

#[test]
fn refinement_rejects_invalid_knots() {
    let curve = rational();
    assert!(curve.try_refine_knot(vec![0.5, 0.2]).is_err());
    assert!(curve.try_refine_knot(vec![1.5]).is_err());
    assert!(curve.try_insert_knot(0.5, 5).is_err());
}

#[test]
fn elevation_keeps_the_shape() {
    let curve = rational();
    for target in [4, 5, 7] {
        let elevated = curve.try_elevate_degree(target).unwrap();
        assert_eq!(elevated.degree(), target);
        assert!(elevated
            .knots()
            .is_valid(target, elevated.control_points().len()));
        for i in 0..=40 {
            let t = i as f64 / 40.;
            assert_relative_eq!(elevated.point_at(t), curve.point_at(t), epsilon = 1e-9);
        }
    }
    assert_eq!(curve.try_elevate_degree(2).unwrap(), curve);
}

#[test]
fn elevation_then_reduction_round_trips() {
    let curve = rational();
    let elevated = curve.try_elevate_degree(4).unwrap();
    let reduced = elevated.try_reduce_degree(1e-8).unwrap();
    assert_eq!(reduced.degree(), 3);
    assert_eq!(reduced.knots().len(), curve.knots().len());
    for i in 0..=40 {
        let t = i as f64 / 40.;
        assert_relative_eq!(reduced.point_at(t), curve.point_at(t), epsilon = 1e-8);
    }
}

#[test]
fn reduction_of_a_genuine_curve_is_rejected() {
    let curve = scenario();
    let err = curve.try_reduce_degree(1e-3).unwrap_err();
    match err.downcast_ref::<CurveError>() {
        Some(CurveError::NotDegreeReducible { error, tolerance, .. }) => {
            assert!(error > tolerance);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn reduction_within_a_loose_tolerance_stays_close() {
    let curve = NurbsCurve2D::try_from_points(
        &[
            Point2::new(0., 0.),
            Point2::new(1., 1.),
            Point2::new(2., 1.1),
            Point2::new(3., 0.),
        ],
        3,
        None,
    )
    .unwrap();
    let tol = 0.5;
    let reduced = curve.try_reduce_degree(tol).unwrap();
    assert_eq!(reduced.degree(), 2);
    for i in 0..=20 {
        let t = i as f64 / 20.;
        assert!((reduced.point_at(t) - curve.point_at(t)).norm() <= tol);
    }
}

#[test]
fn reduction_bound_holds_across_knot_removal() {
    let quadratic = NurbsCurve2D::try_from_points(
        &[
            Point2::new(0., 0.),
            Point2::new(1., 2.),
            Point2::new(3., 2.),
            Point2::new(4., 0.),
            Point2::new(6., 1.),
        ],
        2,
        None,
    )
    .unwrap();
    let elevated = quadratic.try_elevate_degree(3).unwrap();

    // nudge a control point next to an interior knot so the cubic is no longer exactly reducible
    let mut control_points = elevated.control_points().clone();
    control_points[3].y += 0.3;
    let bumped = NurbsCurve2D::try_new(3, control_points, elevated.knots().to_vec()).unwrap();

    let tol = 0.3;
    let reduced = bumped.try_reduce_degree(tol).unwrap();
    assert_eq!(reduced.degree(), 2);
    assert_eq!(reduced.knots().to_vec(), quadratic.knots().to_vec());
    let deviation = (0..=400)
        .map(|i| {
            let t = i as f64 / 400.;
            (reduced.point_at(t) - bumped.point_at(t)).norm()
        })
        .fold(0., f64::max);
    assert!(deviation > 1e-3);
    assert!(deviation <= tol);

    let err = bumped.try_reduce_degree(0.05).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CurveError>(),
        Some(CurveError::NotDegreeReducible { .. })
    ));
}

#[test]
fn rational_derivatives_match_finite_differences() {
    let curve = rational();
    let h = 1e-6;
    for t in [0.2, 0.45, 0.8] {
        let ders = curve.rational_derivatives(t, 2);
        let fd1 = (curve.point_at(t + h) - curve.point_at(t - h)) / (2. * h);
        assert_relative_eq!(ders[1], fd1, epsilon = 1e-5);
        let t1 = curve.rational_derivatives(t + h, 1);
        let t0 = curve.rational_derivatives(t - h, 1);
        let fd2 = (&t1[1] - &t0[1]) / (2. * h);
        assert_relative_eq!(ders[2], fd2, epsilon = 1e-3);
        assert_relative_eq!(curve.tangent_at(t), ders[1]);
    }
}

#[test]
fn closest_point_on_a_curve() {
    let curve = scenario();
    for t in [0.15, 0.5, 0.72] {
        let on = curve.point_at(t);
        let tangent = curve.tangent_at(t).normalize();
        let normal = nalgebra::Vector2::new(-tangent.y, tangent.x);
        let off = on + normal * 0.5;
        let u = curve.find_closest_parameter(&off).unwrap();
        assert_abs_diff_eq!(u, t, epsilon = 1e-4);
        let closest = curve.find_closest_point(&off).unwrap();
        assert_relative_eq!(closest, on, epsilon = 1e-3);
    }

    // beyond the end the closest point is the end point
    let u = curve.find_closest_parameter(&Point2::new(60., 0.)).unwrap();
    assert_relative_eq!(u, 1.);
}

#[test]
fn invalid_constructions_are_reported() {
    let points = vec![
        Point4::new(0., 0., 0., 1.),
        Point4::new(1., 1., 0., 1.),
        Point4::new(2., 0., 0., 1.),
    ];

    let err = NurbsCurve3D::try_new(0, points.clone(), vec![0., 0., 1., 1.]).unwrap_err();
    assert_eq!(err.downcast_ref::<CurveError>(), Some(&CurveError::InvalidDegree));

    let err = NurbsCurve3D::try_new(3, points.clone(), vec![0.; 7]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CurveError>(),
        Some(&CurveError::TooFewControlPoints {
            degree: 3,
            actual: 3
        })
    );

    let err = NurbsCurve3D::try_new(2, points.clone(), vec![0., 0., 0., 1., 1.]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CurveError>(),
        Some(CurveError::InvalidKnotVector(
            KnotVectorError::InvalidLength { .. }
        ))
    ));

    let err =
        NurbsCurve3D::try_new(2, points.clone(), vec![0., 0., 0., 1., 0.5, 1.]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CurveError>(),
        Some(CurveError::InvalidKnotVector(_))
    ));

    let mut weightless = points.clone();
    weightless[1].w = 0.;
    let err = NurbsCurve3D::try_new(2, weightless, vec![0., 0., 0., 1., 1., 1.]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CurveError>(),
        Some(&CurveError::InvalidWeight { index: 1 })
    );

    assert!(NurbsCurve3D::try_new(2, points, vec![0., 0., 0., 1., 1., 1.]).is_ok());
}

#[test]
fn cast_to_f32() {
    let curve = scenario();
    let single = curve.cast::<f32>();
    assert_eq!(single.degree(), 3);
    assert_relative_eq!(single.point_at(0.5), curve.point_at(0.5).cast::<f32>(), epsilon = 1e-4);
}
