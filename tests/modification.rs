use approx::relative_eq;
use nalgebra::{Point2, Point3};
use nurbs_kernel::prelude::*;
use proptest::prelude::*;

const TOL: f64 = 1e-8;

/// Degree, control points and weights of a random clamped curve
fn arb_curve() -> impl Strategy<Value = NurbsCurve2D<f64>> {
    (1usize..=4)
        .prop_flat_map(|degree| {
            (
                Just(degree),
                prop::collection::vec(
                    ((-10.0f64..10.0, -10.0f64..10.0), 0.5f64..2.0),
                    (degree + 1)..(degree + 7),
                ),
            )
        })
        .prop_map(|(degree, points)| {
            let (coords, weights): (Vec<_>, Vec<_>) = points.into_iter().unzip();
            let coords: Vec<_> = coords.into_iter().map(|(x, y)| Point2::new(x, y)).collect();
            NurbsCurve2D::try_from_points(&coords, degree, Some(&weights)).unwrap()
        })
}

/// Clamped knot vector with random interior knots
fn arb_knots() -> impl Strategy<Value = (usize, KnotVector<f64>)> {
    (1usize..=5, prop::collection::vec(0.01f64..0.99, 0..12)).prop_map(|(degree, mut interior)| {
        interior.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let knots = std::iter::repeat_n(0., degree + 1)
            .chain(interior)
            .chain(std::iter::repeat_n(1., degree + 1))
            .collect::<KnotVector<f64>>();
        (degree, knots)
    })
}

fn samples(curve: &NurbsCurve2D<f64>) -> Vec<f64> {
    let (start, end) = curve.knots_domain();
    (0..=24)
        .map(|i| start + (end - start) * i as f64 / 24.)
        .collect()
}

fn same_point(a: &Point2<f64>, b: &Point2<f64>) -> bool {
    relative_eq!(a, b, epsilon = 1e-7, max_relative = 1e-7)
}

proptest! {
    #[test]
    fn knot_span_contains_parameter((degree, knots) in arb_knots(), u in 0.0f64..=1.0) {
        let n = knots.len() - degree - 2;
        let span = knots.try_span(degree, u).unwrap();
        prop_assert!(span >= degree && span <= n);
        prop_assert!(knots[span] <= u);
        prop_assert!(u < knots[span + 1] || span == n, "u {} outside span {}", u, span);
    }

    #[test]
    fn basis_functions_sum_to_one((degree, knots) in arb_knots(), u in 0.0f64..=1.0) {
        let span = knots.try_span(degree, u).unwrap();
        let sum: f64 = knots.basis_functions(span, u, degree).iter().sum();
        prop_assert!((sum - 1.).abs() < TOL);
    }

    #[test]
    fn refinement_round_trip(curve in arb_curve(), inserts in prop::collection::vec(0.01f64..0.99, 1..6)) {
        let mut inserts = inserts;
        inserts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let refined = curve.try_refine_knot(inserts.clone()).unwrap();
        prop_assert_eq!(refined.knots().len(), curve.knots().len() + inserts.len());
        for t in samples(&curve) {
            prop_assert!(same_point(&refined.point_at(t), &curve.point_at(t)));
        }
    }

    #[test]
    fn elevation_round_trip(curve in arb_curve(), raise in 1usize..3) {
        let target = curve.degree() + raise;
        let elevated = curve.try_elevate_degree(target).unwrap();
        prop_assert_eq!(elevated.degree(), target);
        prop_assert!(elevated.knots().is_valid(target, elevated.control_points().len()));
        for t in samples(&curve) {
            prop_assert!(same_point(&elevated.point_at(t), &curve.point_at(t)));
        }
    }

    #[test]
    fn elevated_curve_reduces_back(curve in arb_curve()) {
        let elevated = curve.try_elevate_degree(curve.degree() + 1).unwrap();
        let reduced = elevated.try_reduce_degree(1e-6).unwrap();
        prop_assert_eq!(reduced.degree(), curve.degree());
        for t in samples(&curve) {
            prop_assert!(same_point(&reduced.point_at(t), &curve.point_at(t)));
        }
    }

    #[test]
    fn split_halves_meet(curve in arb_curve(), ratio in 0.05f64..0.95) {
        let (start, end) = curve.knots_domain();
        let u = start + (end - start) * ratio;
        let (left, right) = curve.try_split(u).unwrap();
        let degree = curve.degree();
        prop_assert_eq!(left.knots().multiplicity_of(left.knots_domain().1), degree + 1);
        prop_assert_eq!(right.knots().multiplicity_of(right.knots_domain().0), degree + 1);
        let at = curve.point_at(left.knots_domain().1);
        prop_assert!(same_point(&left.point_at(left.knots_domain().1), &at));
        prop_assert!(same_point(&right.point_at(right.knots_domain().0), &at));
    }

    #[test]
    fn decomposition_reproduces_boundaries(curve in arb_curve()) {
        let segments = curve.try_decompose().unwrap();
        let spans = curve.knots().multiplicity().len() - 1;
        prop_assert_eq!(segments.len(), spans);
        for s in segments.iter() {
            let (a, b) = s.knots_domain();
            prop_assert!(same_point(&s.point_at(a), &curve.point_at(a)));
            prop_assert!(same_point(&s.point_at(b), &curve.point_at(b)));
        }
    }

    #[test]
    fn adaptive_samples_lie_on_the_curve(curve in arb_curve()) {
        let sampled = curve.sample_adaptive(1e-3);
        prop_assert!(sampled.len() >= 2);
        prop_assert!(sampled.windows(2).all(|w| w[0].parameter() < w[1].parameter()));
        for s in sampled.iter() {
            prop_assert!(same_point(s.point(), &curve.point_at(s.parameter())));
        }
    }
}

#[test]
fn three_dimensional_split_and_decompose() {
    let curve = NurbsCurve3D::try_from_points(
        &[
            Point3::new(0., 0., 0.),
            Point3::new(1., 2., 3.),
            Point3::new(3., -1., 1.),
            Point3::new(4., 1., -2.),
            Point3::new(6., 0., 0.),
        ],
        2,
        Some(&[1., 0.5, 2., 1., 1.]),
    )
    .unwrap();
    let (left, right) = curve.try_split(0.3).unwrap();
    let mut pieces = left.try_decompose().unwrap();
    pieces.extend(right.try_decompose().unwrap());
    for piece in pieces.iter() {
        let (a, b) = piece.knots_domain();
        let mid = (a + b) / 2.;
        assert!((piece.point_at(mid) - curve.point_at(mid)).norm() < 1e-10);
    }
}
