use gauss_quad::GaussLegendre;
use nalgebra::allocator::Allocator;
use nalgebra::{
    Const, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};
use simba::scalar::SupersetOf;

use crate::curve::{CurveError, CurveLengthParameter};
use crate::decompose::Decompose;
use crate::knot::KnotVector;
use crate::misc::{Binomial, FloatingPoint, Tolerance};

/// NURBS curve representation
/// By generics, it can be used for 2D or 3D curves with f32 or f64 scalar types
#[derive(Clone, Debug, PartialEq)]
pub struct NurbsCurve<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    /// control points with homogeneous coordinates
    /// the last element of the vector is the `weight`
    control_points: Vec<OPoint<T, D>>,
    degree: usize,
    /// knot vector for the NURBS curve
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
}

/// 2D NURBS curve alias
pub type NurbsCurve2D<T> = NurbsCurve<T, Const<3>>;

/// 3D NURBS curve alias
pub type NurbsCurve3D<T> = NurbsCurve<T, Const<4>>;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a new NURBS curve from homogeneous control points and a clamped knot vector
    /// # Failures
    /// - if the degree is zero
    /// - if the number of control points is not greater than the degree
    /// - if the knot vector is malformed (see `KnotVector::try_validate`)
    /// - if a control point is not finite or has a non-positive weight
    ///
    /// The typed reason can be recovered with `downcast_ref::<CurveError>()`.
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let w = 1.; // weight for each control points
    /// let control_points: Vec<Point3<f64>> = vec![
    ///     Point3::new(50., 50., w),
    ///     Point3::new(30., 370., w),
    ///     Point3::new(180., 350., w),
    ///     Point3::new(150., 100., w),
    /// ];
    /// let knots = vec![0., 0., 0., 0., 1., 1., 1., 1.];
    /// let nurbs = NurbsCurve2D::try_new(3, control_points.clone(), knots);
    /// assert!(nurbs.is_ok());
    ///
    /// let unclamped = NurbsCurve2D::try_new(3, control_points, (0..8).map(|i| i as f64).collect());
    /// let err = unclamped.unwrap_err();
    /// assert!(matches!(
    ///     err.downcast_ref::<CurveError>(),
    ///     Some(CurveError::InvalidKnotVector(_))
    /// ));
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        if degree == 0 {
            return Err(CurveError::InvalidDegree.into());
        }
        if control_points.len() <= degree {
            return Err(CurveError::TooFewControlPoints {
                degree,
                actual: control_points.len(),
            }
            .into());
        }

        let knots = KnotVector::new(knots);
        knots
            .try_validate(degree, control_points.len())
            .map_err(CurveError::from)?;

        let w = D::dim() - 1;
        for (index, p) in control_points.iter().enumerate() {
            if !p.coords.iter().all(|v| v.is_finite()) {
                return Err(CurveError::NonFiniteControlPoint { index }.into());
            }
            if p[w] <= T::zero() {
                return Err(CurveError::InvalidWeight { index }.into());
            }
        }

        Ok(Self {
            degree,
            control_points,
            knots,
        })
    }

    /// Assemble a curve from parts already known to be consistent (results of refinement or slicing)
    pub(crate) fn new_unchecked(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: KnotVector<T>,
    ) -> Self {
        debug_assert_eq!(knots.len(), control_points.len() + degree + 1);
        Self {
            degree,
            control_points,
            knots,
        }
    }

    pub fn weights(&self) -> Vec<T> {
        self.control_points
            .iter()
            .map(|p| p[D::dim() - 1])
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a homogeneous point
    pub fn point(&self, t: T) -> OPoint<T, D> {
        let knot_span_index = self.knots.span(self.degree, t);
        let basis = self.knots.basis_functions(knot_span_index, t, self.degree);
        let mut position = OPoint::<T, D>::origin();
        for i in 0..=self.degree {
            position.coords +=
                &self.control_points[knot_span_index - self.degree + i].coords * basis[i];
        }
        position
    }

    /// Evaluate the homogeneous derivatives up to `derivs` at a given parameter
    /// Orders above the degree are zero vectors
    pub(crate) fn derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, D>> {
        let du = derivs.min(self.degree);
        let mut derivatives = vec![OVector::<T, D>::zeros(); derivs + 1];

        let knot_span_index = self.knots.span(self.degree, u);
        let nders = self
            .knots
            .derivative_basis_functions(knot_span_index, u, self.degree, du);
        for (k, column) in derivatives.iter_mut().enumerate().take(du + 1) {
            for j in 0..=self.degree {
                *column +=
                    &self.control_points[knot_span_index - self.degree + j].coords * nders[k][j];
            }
        }

        derivatives
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &Vec<OPoint<T, D>> {
        &self.control_points
    }

    pub fn control_points_iter(&self) -> impl Iterator<Item = &OPoint<T, D>> {
        self.control_points.iter()
    }

    pub fn knots_domain(&self) -> (T, T) {
        self.knots.domain(self.degree)
    }

    pub fn knots_domain_interval(&self) -> T {
        let (d0, d1) = self.knots_domain();
        d1 - d0
    }

    /// Check if the curve is clamped
    pub fn is_clamped(&self) -> bool {
        self.knots.is_clamped(self.degree)
    }

    /// Fail when an interior knot repeats more than `degree` times
    /// (the Bezier-by-Bezier algorithms require a continuous curve)
    pub(crate) fn ensure_continuous_knots(&self) -> anyhow::Result<()> {
        let multiplicity = self.knots.multiplicity();
        let interior = multiplicity
            .iter()
            .skip(1)
            .take(multiplicity.len().saturating_sub(2));
        for m in interior {
            anyhow::ensure!(
                m.multiplicity() <= self.degree,
                "Interior knot {:?} has multiplicity {} which exceeds the degree {}",
                m.knot(),
                m.multiplicity(),
                self.degree
            );
        }
        Ok(())
    }

    /// Refine the curve by inserting knots (The NURBS Book A5.4)
    /// Returns a new curve with the same shape and the extended knot vector.
    /// # Failures
    /// - if the knots to insert are not sorted or fall outside of the domain
    /// - if an insertion raises a knot multiplicity above `degree + 1`
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(3., 2.), Point2::new(4., 0.)],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let refined = curve.try_refine_knot(vec![0.25, 0.25, 0.7]).unwrap();
    /// assert_eq!(refined.knots().len(), curve.knots().len() + 3);
    /// assert_relative_eq!(refined.point_at(0.4), curve.point_at(0.4), epsilon = 1e-10);
    /// ```
    pub fn try_refine_knot(&self, knots_to_insert: Vec<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(self.is_clamped(), "Curve must be clamped to refine knots");

        if knots_to_insert.is_empty() {
            return Ok(self.clone());
        }

        anyhow::ensure!(
            knots_to_insert.iter().all(|k| k.is_finite()),
            "Knots to insert must be finite"
        );
        anyhow::ensure!(
            knots_to_insert.windows(2).all(|w| w[0] <= w[1]),
            "Knots to insert must be sorted in non-decreasing order"
        );
        let (start, end) = self.knots_domain();
        anyhow::ensure!(
            knots_to_insert[0] >= start && knots_to_insert[knots_to_insert.len() - 1] <= end,
            "Knots to insert must lie within the domain"
        );

        let eps = Tolerance::epsilon();
        let mut i = 0;
        while i < knots_to_insert.len() {
            let value = knots_to_insert[i];
            let count = knots_to_insert[i..]
                .iter()
                .take_while(|k| (**k - value).abs() <= eps)
                .count();
            let existing = self.knots.multiplicity_of(value);
            anyhow::ensure!(
                existing + count <= self.degree + 1,
                "Inserting knot {:?} {} times exceeds the maximum multiplicity {} (existing {})",
                value,
                count,
                self.degree + 1,
                existing
            );
            i += count;
        }

        let degree = self.degree;
        let control_points = &self.control_points;
        let knots = &self.knots;

        let n = control_points.len() - 1;
        let m = n + degree + 1;
        let r = knots_to_insert.len() - 1;
        let a = knots.find_knot_span_index(n, degree, knots_to_insert[0]);
        let b = knots.find_knot_span_index(n, degree, knots_to_insert[r]) + 1;

        let mut control_points_post = vec![OPoint::<T, D>::origin(); n + r + 2];
        let mut knots_post = vec![T::zero(); m + r + 2];

        control_points_post[..=(a - degree)].clone_from_slice(&control_points[..=(a - degree)]);
        for i in (b - 1)..=n {
            control_points_post[i + r + 1] = control_points[i].clone();
        }

        knots_post[..=a].copy_from_slice(&knots.as_slice()[..=a]);
        for i in (b + degree)..=m {
            knots_post[i + r + 1] = knots[i];
        }

        let mut i = b + degree - 1;
        let mut k = b + degree + r;

        for j in (0..=r).rev() {
            while knots_to_insert[j] <= knots[i] && i > a {
                control_points_post[k - degree - 1] = control_points[i - degree - 1].clone();
                knots_post[k] = knots[i];
                k -= 1;
                i -= 1;
            }
            control_points_post[k - degree - 1] = control_points_post[k - degree].clone();
            for l in 1..=degree {
                let ind = k - degree + l;
                let alpha = knots_post[k + l] - knots_to_insert[j];
                if alpha.abs() < eps {
                    control_points_post[ind - 1] = control_points_post[ind].clone();
                } else {
                    let denom = knots_post[k + l] - knots[i - degree + l];
                    let weight = if denom != T::zero() {
                        alpha / denom
                    } else {
                        T::zero()
                    };
                    control_points_post[ind - 1] = control_points_post[ind - 1]
                        .lerp(&control_points_post[ind], T::one() - weight);
                }
            }
            knots_post[k] = knots_to_insert[j];
            k -= 1;
        }

        Ok(Self::new_unchecked(
            degree,
            control_points_post,
            KnotVector::new(knots_post),
        ))
    }

    /// Insert the knot `u` `times` times
    pub fn try_insert_knot(&self, u: T, times: usize) -> anyhow::Result<Self> {
        self.try_refine_knot(vec![u; times])
    }

    /// Elevate the degree of the curve to `target_degree` (The NURBS Book A5.9)
    /// Returns a clone when `target_degree` is not greater than the current degree.
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(3., 2.), Point2::new(4., 0.)],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let elevated = curve.try_elevate_degree(4).unwrap();
    /// assert_eq!(elevated.degree(), 4);
    /// for t in [0., 0.2, 0.5, 0.9, 1.] {
    ///     assert_relative_eq!(elevated.point_at(t), curve.point_at(t), epsilon = 1e-10);
    /// }
    /// ```
    pub fn try_elevate_degree(&self, target_degree: usize) -> anyhow::Result<Self> {
        if target_degree <= self.degree {
            return Ok(self.clone());
        }
        anyhow::ensure!(self.is_clamped(), "Curve must be clamped to elevate degree");
        self.ensure_continuous_knots()?;

        let eps = Tolerance::epsilon();
        let knots = self.knots.as_slice();
        let pw: Vec<OVector<T, D>> = self
            .control_points
            .iter()
            .map(|p| p.coords.clone())
            .collect();

        let p = self.degree;
        let t = target_degree - p;
        let n = pw.len() - 1;
        let m = n + p + 1;
        let ph = p + t;
        let ph2 = ph / 2;
        let one = T::one();

        // coefficients for degree elevating a Bezier segment
        let mut binom = Binomial::<T>::new();
        let mut bezalfs = vec![vec![T::zero(); p + 1]; ph + 1];
        bezalfs[0][0] = one;
        bezalfs[ph][p] = one;
        for i in 1..=ph2 {
            let inv = one / binom.get(ph, i);
            for j in i.saturating_sub(t)..=p.min(i) {
                bezalfs[i][j] = inv * binom.get(p, j) * binom.get(t, i - j);
            }
        }
        for i in (ph2 + 1)..ph {
            for j in i.saturating_sub(t)..=p.min(i) {
                bezalfs[i][j] = bezalfs[ph - i][p - j];
            }
        }

        let zero = OVector::<T, D>::zeros();
        let capacity = (n + 1) * (t + 1) + ph + 1;
        let mut qw = vec![zero.clone(); capacity];
        let mut uh = vec![T::zero(); capacity + ph + 1];
        let mut bpts = pw[..=p].to_vec();
        let mut ebpts = vec![zero.clone(); ph + 1];
        let mut next_bpts = vec![zero.clone(); p + 1];
        let mut alfs = vec![T::zero(); p];

        let mut mh = ph;
        let mut kind = ph + 1;
        let mut r: isize = -1;
        let mut a = p;
        let mut b = p + 1;
        let mut cind = 1;
        let mut ua = knots[0];

        qw[0] = pw[0].clone();
        for v in uh.iter_mut().take(ph + 1) {
            *v = ua;
        }

        while b < m {
            let i = b;
            while b < m && (knots[b + 1] - knots[b]).abs() <= eps {
                b += 1;
            }
            let mul = b - i + 1;
            mh += mul + t;
            let ub = knots[b];
            let oldr = r;
            r = p as isize - mul as isize;

            // left and right bounds of the elevated segment to store
            let lbz = if oldr > 0 { ((oldr + 2) / 2) as usize } else { 1 };
            let rbz = if r > 0 { ph - ((r + 1) / 2) as usize } else { ph };

            // insert knot u(b) r times
            if r > 0 {
                let r = r as usize;
                let numer = ub - ua;
                for k in ((mul + 1)..=p).rev() {
                    alfs[k - mul - 1] = numer / (knots[a + k] - ua);
                }
                for j in 1..=r {
                    let save = r - j;
                    let s = mul + j;
                    for k in (s..=p).rev() {
                        let alpha = alfs[k - s];
                        bpts[k] = &bpts[k] * alpha + &bpts[k - 1] * (one - alpha);
                    }
                    next_bpts[save] = bpts[p].clone();
                }
            }

            // degree elevate the Bezier segment
            for i in lbz..=ph {
                let mut acc = zero.clone();
                for j in i.saturating_sub(t)..=p.min(i) {
                    acc += &bpts[j] * bezalfs[i][j];
                }
                ebpts[i] = acc;
            }

            // remove knot u = ua oldr times
            if oldr > 1 {
                let oldr = oldr as usize;
                let mut first = kind - 2;
                let mut last = kind;
                let den = ub - ua;
                let bet = (ub - uh[kind - 1]) / den;
                for tr in 1..oldr {
                    let mut i = first;
                    let mut j = last;
                    let mut kj = j - kind + 1;
                    while j - i > tr {
                        if i < cind {
                            let alf = (ub - uh[i]) / (ua - uh[i]);
                            qw[i] = &qw[i] * alf + &qw[i - 1] * (one - alf);
                        }
                        if j >= lbz {
                            // j - tr <= kind - ph + oldr
                            let coef = if j + ph <= kind + oldr + tr {
                                (ub - uh[j - tr]) / den
                            } else {
                                bet
                            };
                            ebpts[kj] = &ebpts[kj] * coef + &ebpts[kj + 1] * (one - coef);
                        }
                        i += 1;
                        j -= 1;
                        kj -= 1;
                    }
                    first -= 1;
                    last += 1;
                }
            }

            // load the knot ua
            if a != p {
                let repeat = (ph as isize - oldr) as usize;
                for _ in 0..repeat {
                    uh[kind] = ua;
                    kind += 1;
                }
            }

            // load control points into qw
            for j in lbz..=rbz {
                qw[cind] = ebpts[j].clone();
                cind += 1;
            }

            if b < m {
                // set up for the next pass through the loop
                let r = r.max(0) as usize;
                bpts[..r].clone_from_slice(&next_bpts[..r]);
                for j in r..=p {
                    bpts[j] = pw[b - p + j].clone();
                }
                a = b;
                b += 1;
                ua = ub;
            } else {
                // end knot
                for i in 0..=ph {
                    uh[kind + i] = ub;
                }
            }
        }

        let nh = mh - ph - 1;
        qw.truncate(nh + 1);
        uh.truncate(nh + ph + 2);

        Ok(Self::new_unchecked(
            ph,
            qw.into_iter().map(OPoint::from).collect(),
            KnotVector::new(uh),
        ))
    }

    /// Cast the curve to a curve with another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> NurbsCurve<F, D> {
        NurbsCurve {
            control_points: self
                .control_points
                .iter()
                .map(|p| p.clone().cast())
                .collect(),
            degree: self.degree,
            knots: self.knots.cast(),
        }
    }
}

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a clamped curve with uniformly spaced interior knots from cartesian points
    /// Weights default to `1`.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![Point2::new(0., 0.), Point2::new(1., 1.), Point2::new(2., 0.)];
    /// let curve = NurbsCurve2D::try_from_points(&points, 2, Some(&[1., 2., 1.])).unwrap();
    /// assert_eq!(curve.weights(), vec![1., 2., 1.]);
    /// assert_relative_eq!(curve.point_at(0.), points[0]);
    /// assert_relative_eq!(curve.point_at(1.), points[2]);
    /// ```
    pub fn try_from_points(
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        degree: usize,
        weights: Option<&[T]>,
    ) -> anyhow::Result<Self> {
        let weights = match weights {
            Some(w) => {
                anyhow::ensure!(
                    w.len() == points.len(),
                    "Invalid number of weights, got {}, expected {}",
                    w.len(),
                    points.len()
                );
                w.to_vec()
            }
            None => vec![T::one(); points.len()],
        };

        let dim = D::dim() - 1;
        let control_points = points
            .iter()
            .zip(weights.iter())
            .map(|(p, w)| {
                let mut coords = OVector::<T, D>::zeros();
                for i in 0..dim {
                    coords[i] = p[i] * *w;
                }
                coords[dim] = *w;
                OPoint::from(coords)
            })
            .collect();

        let knots = KnotVector::generate(degree, points.len(), true);
        Self::try_new(degree, control_points, knots.to_vec())
    }

    /// Create a degree 1 curve passing through every point
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let polyline = NurbsCurve2D::try_polyline(&[
    ///     Point2::new(0., 0.),
    ///     Point2::new(1., 0.),
    ///     Point2::new(1., 1.),
    /// ]).unwrap();
    /// assert_eq!(polyline.degree(), 1);
    /// assert_relative_eq!(polyline.point_at(0.5), Point2::new(1., 0.));
    /// ```
    pub fn try_polyline(points: &[OPoint<T, DimNameDiff<D, U1>>]) -> anyhow::Result<Self> {
        Self::try_from_points(points, 1, None)
    }

    /// Create a dehomogenized version of the curve
    pub fn dehomogenize(&self) -> NurbsCurve<T, DimNameDiff<D, U1>> {
        NurbsCurve {
            degree: self.degree,
            control_points: self.dehomogenized_control_points(),
            knots: self.knots.clone(),
        }
    }

    /// Return the dehomogenized control points
    pub fn dehomogenized_control_points(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.control_points
            .iter()
            .filter_map(dehomogenize)
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a dehomonogenized point
    pub fn point_at(&self, t: T) -> OPoint<T, DimNameDiff<D, U1>> {
        let p = self.point(t);
        dehomogenize(&p).unwrap_or_else(OPoint::origin)
    }

    /// Evaluate the curve at a given parameter to get a tangent vector
    pub fn tangent_at(&self, u: T) -> OVector<T, DimNameDiff<D, U1>> {
        let mut deriv = self.rational_derivatives(u, 1);
        deriv.swap_remove(1)
    }

    /// Evaluate the rational derivatives at a given parameter
    /// The first element is the point itself, the `k`th element is the `k`th derivative.
    pub fn rational_derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, DimNameDiff<D, U1>>> {
        let ders = self.derivatives(u, derivs);
        let dim = D::dim() - 1;
        let a_ders: Vec<_> = ders
            .iter()
            .map(|d| OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| d[i]))
            .collect();
        let w_ders: Vec<_> = ders.iter().map(|d| d[dim]).collect();

        let mut ck: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs + 1);
        let mut binom = Binomial::<T>::new();
        for k in 0..=derivs {
            let mut v = a_ders[k].clone();

            for i in 1..=k {
                let coef = binom.get(k, i) * w_ders[i];
                v -= &ck[k - i] * coef;
            }

            ck.push(v / w_ders[0]);
        }
        ck
    }

    /// Compute the length of the curve by gauss-legendre quadrature on each Bezier segment
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// let corner_weight = 1. / 2.;
    /// let unit_circle = NurbsCurve2D::try_new(
    ///     2,
    ///     vec![
    ///         Point3::new(1.0, 0.0, 1.),
    ///         Point3::new(1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 0.0, 1.),
    ///         Point3::new(-1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, 0.0, 1.),
    ///     ],
    ///     vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    /// ).unwrap();
    /// let approx = unit_circle.try_length().unwrap();
    /// let goal = 2.0 * std::f64::consts::PI; // circumference of the unit circle
    /// assert_relative_eq!(approx, goal, epsilon = 1e-8);
    /// ```
    pub fn try_length(&self) -> anyhow::Result<T> {
        let segments = self.try_decompose()?;
        let gauss = GaussLegendre::init(16 + self.degree);
        let length = segments
            .iter()
            .map(|s| compute_bezier_segment_length(s, s.knots_domain().1, &gauss))
            .fold(T::zero(), |a, b| a + b);
        Ok(length)
    }

    /// Arc length from the start of the curve to the parameter `t` (clamped to the domain)
    pub fn try_length_at(&self, t: T) -> anyhow::Result<T> {
        let t = self.knots.clamp(self.degree, t);
        let segments = self.try_decompose()?;
        let gauss = GaussLegendre::init(16 + self.degree);
        let mut length = T::zero();
        for s in segments.iter() {
            let (start, end) = s.knots_domain();
            if start >= t {
                break;
            }
            length += compute_bezier_segment_length(s, end.min(t), &gauss);
        }
        Ok(length)
    }

    /// Find the parameter where the arc length from the start reaches `length`
    /// The bisection stops once the bracketing lengths are closer than `tolerance`.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let line = NurbsCurve2D::try_polyline(&[Point2::new(0., 0.), Point2::new(4., 0.)]).unwrap();
    /// let u = line.try_parameter_at_length(1., 1e-9).unwrap();
    /// assert_relative_eq!(u, 0.25, epsilon = 1e-8);
    /// ```
    pub fn try_parameter_at_length(&self, length: T, tolerance: T) -> anyhow::Result<T> {
        anyhow::ensure!(
            length >= T::zero(),
            "The length must be greater than or equal to zero"
        );
        anyhow::ensure!(tolerance > T::zero(), "The tolerance must be positive");

        let segments = self.try_decompose()?;
        let gauss = GaussLegendre::init(16 + self.degree);
        let mut acc = T::zero();
        for s in segments.iter() {
            let current = compute_bezier_segment_length(s, s.knots_domain().1, &gauss);
            if length <= acc + current {
                return Ok(compute_bezier_segment_parameter_at_length(
                    s,
                    length - acc,
                    tolerance,
                    current,
                    &gauss,
                ));
            }
            acc += current;
        }

        anyhow::ensure!(
            length <= acc + tolerance,
            "The length {:?} exceeds the curve length {:?}",
            length,
            acc
        );
        Ok(self.knots_domain().1)
    }

    /// Divide a NURBS curve by a given length
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// let corner_weight = 1. / 2.;
    /// let unit_circle = NurbsCurve2D::try_new(
    ///     2,
    ///     vec![
    ///         Point3::new(1.0, 0.0, 1.),
    ///         Point3::new(1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 0.0, 1.),
    ///         Point3::new(-1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, 0.0, 1.),
    ///     ],
    ///     vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    /// ).unwrap();
    /// let u = std::f64::consts::FRAC_PI_2; // 90 degrees
    /// let params = unit_circle.try_divide_by_length(u).unwrap();
    /// let total_length = 2.0 * std::f64::consts::PI; // circumference of the unit circle
    /// assert_eq!(params.len(), 5);
    /// assert_relative_eq!(params[0].length(), 0.);
    /// assert_relative_eq!(params[1].length(), total_length / 4.);
    /// assert_relative_eq!(params[1].parameter(), 0.25, epsilon = 1e-8);
    /// assert_relative_eq!(params[4].length(), total_length);
    /// ```
    pub fn try_divide_by_length(&self, length: T) -> anyhow::Result<Vec<CurveLengthParameter<T>>> {
        anyhow::ensure!(length > T::zero(), "The length must be greater than zero");

        let segments = self.try_decompose()?;
        let gauss = GaussLegendre::init(16 + self.degree);
        let lengthes: Vec<T> = segments
            .iter()
            .map(|s| compute_bezier_segment_length(s, s.knots_domain().1, &gauss))
            .collect();
        let total = lengthes.iter().fold(T::zero(), |a, b| a + *b);

        let eps = T::from_f64_lossy(1e-6);
        anyhow::ensure!(
            total + eps >= length,
            "The curve is too short to divide by the given length"
        );

        let mut samples = vec![CurveLengthParameter::new(self.knots_domain().0, T::zero())];

        let mut lc = length;
        let mut acc = T::zero();
        let mut acc_prev = T::zero();
        let tolerance = Tolerance::epsilon();

        for (segment, current_length) in segments.iter().zip(lengthes.iter()) {
            acc += *current_length;

            while lc < acc + eps {
                let u = compute_bezier_segment_parameter_at_length(
                    segment,
                    lc - acc_prev,
                    tolerance,
                    *current_length,
                    &gauss,
                );
                samples.push(CurveLengthParameter::new(u, lc));
                lc += length;
            }

            acc_prev += *current_length;
        }

        Ok(samples)
    }

    /// Divide the curve into `segments` pieces of equal arc length
    /// Returns `segments + 1` parameters including both ends of the domain
    pub fn try_divide_by_count(
        &self,
        segments: usize,
    ) -> anyhow::Result<Vec<CurveLengthParameter<T>>> {
        anyhow::ensure!(segments > 0, "The number of segments must be positive");
        let length = self.try_length()?;
        let u = length / T::from_count(segments);
        self.try_divide_by_length(u)
    }
}

/// Find the curve parameter at arc length on a Bezier segment of a NURBS curve
/// by binary search
fn compute_bezier_segment_parameter_at_length<T: FloatingPoint, D: DimName>(
    s: &NurbsCurve<T, D>,
    length: T,
    tolerance: T,
    total_length: T,
    gauss: &GaussLegendre,
) -> T
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let (k0, k1) = s.knots_domain();
    if length <= T::zero() {
        return k0;
    } else if length >= total_length {
        return k1;
    }

    let mut start = (k0, T::zero());
    let mut end = (k1, total_length);

    let half = T::from_f64_lossy(0.5);
    let eps = Tolerance::epsilon::<T>();

    while (end.1 - start.1) > tolerance && (end.0 - start.0) > eps {
        let middle_parameter = (start.0 + end.0) * half;
        let mid = (
            middle_parameter,
            compute_bezier_segment_length(s, middle_parameter, gauss),
        );
        if mid.1 > length {
            end = mid;
        } else {
            start = mid;
        }
    }

    // interpolate inside the final bracket
    let span = end.1 - start.1;
    if span > T::zero() {
        start.0 + (end.0 - start.0) * (length - start.1) / span
    } else {
        (start.0 + end.0) * half
    }
}

/// Compute the length of a Bezier segment of a NURBS curve from its start to `u`
/// by gauss-legendre quadrature
fn compute_bezier_segment_length<T: FloatingPoint, D: DimName>(
    s: &NurbsCurve<T, D>,
    u: T,
    gauss: &GaussLegendre,
) -> T
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let (start, end) = s.knots_domain();
    if start + T::default_epsilon() < u {
        let t = end.min(u);
        let left = start.to_f64().unwrap_or(0.);
        let right = t.to_f64().unwrap_or(0.);
        let sum = gauss.integrate(left, right, |x| {
            let x = T::from_f64_lossy(x);
            let deriv = s.rational_derivatives(x, 1);
            deriv[1].norm().to_f64().unwrap_or(0.)
        });
        T::from_f64_lossy(sum)
    } else {
        T::zero()
    }
}

/// Dehomogenize a point
/// Weights within epsilon of one skip the division
pub fn dehomogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, D>,
) -> Option<OPoint<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let v = &point.coords;
    let idx = D::dim() - 1;
    let w = v[idx];
    if w == T::zero() {
        return None;
    }
    let coords = v
        .generic_view((0, 0), (<D as DimNameSub<U1>>::Output::name(), Const::<1>))
        .into_owned();
    if (w - T::one()).abs() < Tolerance::epsilon() {
        Some(OPoint { coords })
    } else {
        Some(OPoint {
            coords: coords / w,
        })
    }
}
