use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector};

use crate::curve::{CurveError, NurbsCurve};
use crate::knot::KnotVector;
use crate::misc::{all_finite, FloatingPoint, Tolerance};

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Reduce the degree of the curve by one (The NURBS Book A5.11)
    ///
    /// The error introduced on each Bezier segment is accumulated per knot span,
    /// measured on the homogeneous control points.
    /// Fails with `CurveError::NotDegreeReducible` as soon as the accumulated error
    /// exceeds `tolerance`, the curve is never returned with a larger deviation.
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let quadratic = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(2., 0.)],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let cubic = quadratic.try_elevate_degree(3).unwrap();
    /// let reduced = cubic.try_reduce_degree(1e-8).unwrap();
    /// assert_eq!(reduced.degree(), 2);
    /// assert_relative_eq!(reduced.point_at(0.3), quadratic.point_at(0.3), epsilon = 1e-10);
    ///
    /// // a genuine cubic cannot be represented as a quadratic within a tight tolerance
    /// let err = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(2., -2.), Point2::new(3., 0.)],
    ///     3,
    ///     None,
    /// ).unwrap().try_reduce_degree(1e-3).unwrap_err();
    /// assert!(matches!(
    ///     err.downcast_ref::<CurveError>(),
    ///     Some(CurveError::NotDegreeReducible { .. })
    /// ));
    /// ```
    pub fn try_reduce_degree(&self, tolerance: T) -> anyhow::Result<Self> {
        anyhow::ensure!(
            self.degree() >= 2,
            "Curve degree must be at least 2 to reduce"
        );
        anyhow::ensure!(
            tolerance >= T::zero(),
            "Tolerance must not be negative"
        );
        anyhow::ensure!(self.is_clamped(), "Curve must be clamped to reduce degree");
        self.ensure_continuous_knots()?;

        let eps = Tolerance::epsilon();
        let knots = self.knots().as_slice();
        let qw: Vec<OVector<T, D>> = self
            .control_points()
            .iter()
            .map(|p| p.coords.clone())
            .collect();

        let p = self.degree();
        let n = qw.len() - 1;
        let m = n + p + 1;
        let ph = p - 1;
        let one = T::one();

        let not_reducible = |index: usize, error: T| CurveError::NotDegreeReducible {
            index,
            error: error.to_f64().unwrap_or(f64::NAN),
            tolerance: tolerance.to_f64().unwrap_or(f64::NAN),
        };

        let zero = OVector::<T, D>::zeros();
        let capacity = n + p + 2;
        let mut pw = vec![zero.clone(); capacity];
        let mut uh = vec![T::zero(); capacity + p + 2];
        let mut bpts = qw[..=p].to_vec();
        let mut next_bpts = vec![zero.clone(); p + 1];
        let mut alphas = vec![T::zero(); p];
        let mut e = vec![T::zero(); m];

        let mut mh = ph;
        let mut kind = ph + 1;
        let mut r: isize = -1;
        let mut a = p;
        let mut b = p + 1;
        let mut cind = 1;

        pw[0] = qw[0].clone();
        for v in uh.iter_mut().take(ph + 1) {
            *v = knots[0];
        }

        while b < m {
            let i = b;
            while b < m && (knots[b + 1] - knots[b]).abs() <= eps {
                b += 1;
            }
            let mult = b - i + 1;
            mh = mh + mult - 1;
            let oldr = r;
            r = p as isize - mult as isize;
            let lbz = if oldr > 0 { ((oldr + 2) / 2) as usize } else { 1 };

            // insert knot U[b] r times
            if r > 0 {
                let r = r as usize;
                let numer = knots[b] - knots[a];
                for k in ((mult + 1)..=p).rev() {
                    alphas[k - mult - 1] = numer / (knots[a + k] - knots[a]);
                }
                for j in 1..=r {
                    let save = r - j;
                    let s = mult + j;
                    for k in (s..=p).rev() {
                        let alpha = alphas[k - s];
                        bpts[k] = &bpts[k] * alpha + &bpts[k - 1] * (one - alpha);
                    }
                    next_bpts[save] = bpts[p].clone();
                }
            }

            // degree reduce the Bezier segment
            let (mut rbpts, max_error) = reduce_bezier_segment(&bpts);
            e[a] += max_error;
            if e[a] > tolerance {
                log::debug!("degree reduction rejected at knot index {}", a);
                return Err(not_reducible(a, e[a]).into());
            }

            // remove knot U[a] oldr times
            if oldr > 0 {
                let oldr = oldr as usize;
                let mut first = kind;
                let mut last = kind;
                let mut i = first;
                for k in 0..oldr {
                    i = first;
                    let mut j = last;
                    let mut kj = j - kind;
                    while j - i > k {
                        let alpha = (knots[a] - uh[i - 1]) / (knots[b] - uh[i - 1]);
                        let beta = (knots[a] - uh[j - k - 1]) / (knots[b] - uh[j - k - 1]);
                        pw[i - 1] = (&pw[i - 1] - &pw[i - 2] * (one - alpha)) / alpha;
                        rbpts[kj] = (&rbpts[kj] - &rbpts[kj + 1] * beta) / (one - beta);
                        i += 1;
                        j -= 1;
                        kj -= 1;
                    }

                    // error bound for the knot removal
                    let br = if j - i < k {
                        (&pw[i - 2] - &rbpts[kj + 1]).norm()
                    } else {
                        let delta = (knots[a] - uh[i - 1]) / (knots[b] - uh[i - 1]);
                        let blended = &rbpts[kj + 1] * delta + &pw[i - 2] * (one - delta);
                        (&pw[i - 1] - blended).norm()
                    };

                    // update the error vector
                    let upper = a + oldr - k;
                    let q = (2 * p - k + 1) / 2;
                    for ii in (upper - q)..=a {
                        e[ii] += br;
                        if e[ii] > tolerance {
                            log::debug!("degree reduction rejected at knot index {}", ii);
                            return Err(not_reducible(ii, e[ii]).into());
                        }
                    }
                    first -= 1;
                    last += 1;
                }
                cind = i - 1;
            }

            // load the knot U[a]
            if a != p {
                let repeat = (ph as isize - oldr) as usize;
                for _ in 0..repeat {
                    uh[kind] = knots[a];
                    kind += 1;
                }
            }

            // load control points into pw
            for rb in rbpts.iter().take(ph + 1).skip(lbz) {
                pw[cind] = rb.clone();
                cind += 1;
            }

            if b < m {
                // set up for the next pass through the loop
                let r = r.max(0) as usize;
                bpts[..r].clone_from_slice(&next_bpts[..r]);
                for j in r..=p {
                    bpts[j] = qw[b - p + j].clone();
                }
                a = b;
                b += 1;
            } else {
                for i in 0..=ph {
                    uh[kind + i] = knots[b];
                }
            }
        }

        let nh = mh - ph - 1;
        pw.truncate(nh + 1);
        uh.truncate(nh + ph + 2);

        anyhow::ensure!(
            pw.iter().all(|v| all_finite(v.iter())),
            "Degree reduction produced non-finite control points"
        );

        Ok(Self::new_unchecked(
            ph,
            pw.into_iter().map(OPoint::from).collect(),
            KnotVector::new(uh),
        ))
    }
}

/// Reduce a Bezier segment of degree `p` (given by its `p + 1` control points) to degree `p - 1`
/// Control points are solved from both ends and met in the middle, returns the reduced points and
/// the maximum error of the approximation.
fn reduce_bezier_segment<T: FloatingPoint, D: DimName>(
    bpts: &[OVector<T, D>],
) -> (Vec<OVector<T, D>>, T)
where
    DefaultAllocator: Allocator<D>,
{
    let p = bpts.len() - 1;
    let r = (p - 1) / 2;
    let one = T::one();
    let half = T::from_f64_lossy(0.5);
    let alpha = |i: usize| T::from_count(i) / T::from_count(p);

    let mut out = vec![OVector::<T, D>::zeros(); p];
    out[0] = bpts[0].clone();
    out[p - 1] = bpts[p].clone();

    if p % 2 == 0 {
        for i in 1..=r {
            out[i] = (&bpts[i] - &out[i - 1] * alpha(i)) / (one - alpha(i));
        }
        for i in ((r + 1)..=(p - 2)).rev() {
            out[i] = (&bpts[i + 1] - &out[i + 1] * (one - alpha(i + 1))) / alpha(i + 1);
        }
        let error = (&bpts[r + 1] - (&out[r] + &out[r + 1]) * half).norm();
        (out, error)
    } else {
        for i in 1..r {
            out[i] = (&bpts[i] - &out[i - 1] * alpha(i)) / (one - alpha(i));
        }
        for i in ((r + 1)..=(p - 2)).rev() {
            out[i] = (&bpts[i + 1] - &out[i + 1] * (one - alpha(i + 1))) / alpha(i + 1);
        }
        let left = (&bpts[r] - &out[r - 1] * alpha(r)) / (one - alpha(r));
        let right = (&bpts[r + 1] - &out[r + 1] * (one - alpha(r + 1))) / alpha(r + 1);
        let error = half * (one - alpha(r)) * (&left - &right).norm();
        out[r] = (left + right) * half;
        (out, error)
    }
}
