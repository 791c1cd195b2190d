use std::ops::Index;

use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::knot::KnotVectorError;
use crate::misc::{FloatingPoint, Tolerance};
use crate::prelude::KnotMultiplicity;

/// Knot vector representation
#[derive(Clone, Debug, PartialEq)]
pub struct KnotVector<T>(Vec<T>);

/// Division that maps a zero denominator (zero-length knot interval) to zero
fn safe_div<T: FloatingPoint>(num: T, den: T) -> T {
    if den == T::zero() {
        T::zero()
    } else {
        num / den
    }
}

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Generate a knot vector for `num_control_points` control points of the given degree
    /// on the domain `[0, 1]`.
    /// A clamped vector repeats both ends `degree + 1` times and spaces the interior knots uniformly,
    /// an unclamped vector is uniform over all knots.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::generate(2, 4, true);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 0.5, 1., 1., 1.]);
    /// let knots: KnotVector<f64> = KnotVector::generate(1, 3, false);
    /// assert_eq!(knots.to_vec(), vec![0., 0.25, 0.5, 0.75, 1.]);
    /// ```
    pub fn generate(degree: usize, num_control_points: usize, clamped: bool) -> Self {
        let m = num_control_points + degree + 1;
        if clamped {
            let segments = num_control_points.saturating_sub(degree).max(1);
            let inv = T::one() / T::from_count(segments);
            let mut knots = vec![T::zero(); degree + 1];
            knots.extend((1..segments).map(|i| T::from_count(i) * inv));
            knots.extend(std::iter::repeat_n(T::one(), degree + 1));
            Self(knots)
        } else {
            let inv = T::one() / T::from_count(m - 1);
            Self((0..m).map(|i| T::from_count(i) * inv).collect())
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> Option<T> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<T> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Get the domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    pub fn clamp(&self, degree: usize, u: T) -> T {
        let (min, max) = self.domain(degree);
        u.clamp(min, max)
    }

    /// Check that the knot vector can carry `num_control_points` control points of `degree`
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::{KnotVector, KnotVectorError};
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 2., 2.]);
    /// assert!(knots.try_validate(2, 4).is_ok());
    /// assert_eq!(
    ///     knots.try_validate(2, 5),
    ///     Err(KnotVectorError::InvalidLength { expected: 8, actual: 7 })
    /// );
    /// ```
    pub fn try_validate(
        &self,
        degree: usize,
        num_control_points: usize,
    ) -> Result<(), KnotVectorError> {
        let expected = num_control_points + degree + 1;
        if self.len() != expected {
            return Err(KnotVectorError::InvalidLength {
                expected,
                actual: self.len(),
            });
        }

        if let Some(index) = self.0.iter().position(|k| !k.is_finite()) {
            return Err(KnotVectorError::NonFinite { index });
        }

        if let Some(index) = self.0.windows(2).position(|w| w[1] < w[0]) {
            return Err(KnotVectorError::Decreasing { index: index + 1 });
        }

        if !self.is_clamped(degree) {
            return Err(KnotVectorError::NotClamped {
                required: degree + 1,
            });
        }

        let (start, end) = self.domain(degree);
        if end - start <= Tolerance::epsilon() {
            return Err(KnotVectorError::EmptyDomain);
        }

        let max = degree + 1;
        let mut index = 0;
        for m in self.multiplicity().iter() {
            if m.multiplicity() > max {
                return Err(KnotVectorError::ExcessiveMultiplicity { index, max });
            }
            index += m.multiplicity();
        }

        Ok(())
    }

    /// Same as `try_validate` but only reports whether the vector is usable
    pub fn is_valid(&self, degree: usize, num_control_points: usize) -> bool {
        self.try_validate(degree, num_control_points).is_ok()
    }

    /// Remap the knots linearly onto `[0, 1]`
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![2., 2., 3., 6., 6.]);
    /// let normalized = knots.try_normalize().unwrap();
    /// assert_eq!(normalized.to_vec(), vec![0., 0., 0.25, 1., 1.]);
    /// ```
    pub fn try_normalize(&self) -> Result<Self, KnotVectorError> {
        let (Some(start), Some(end)) = (self.first(), self.last()) else {
            return Err(KnotVectorError::EmptyDomain);
        };
        let span = end - start;
        if span <= Tolerance::epsilon() {
            return Err(KnotVectorError::EmptyDomain);
        }
        Ok(self.0.iter().map(|k| (*k - start) / span).collect())
    }

    /// Get the multiplicity of each knot
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 3);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[2].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].multiplicity(), 3);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let mut mult = vec![];
        if self.0.is_empty() {
            return mult;
        }

        let eps = Tolerance::epsilon();
        let mut current = KnotMultiplicity::new(self.0[0], 0);
        self.0.iter().for_each(|knot| {
            if (*knot - *current.knot()).abs() > eps {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Number of knots equal to `u` within epsilon
    pub fn multiplicity_of(&self, u: T) -> usize {
        let eps = Tolerance::epsilon();
        self.0.iter().filter(|k| (**k - u).abs() <= eps).count()
    }

    /// Check if the knot vector is clamped
    /// `clamped` means the first and last knots have a multiplicity greater than the degree
    /// e.g. [0, 0, 0, 1, 2, 3, 3, 3] with degree 2 is clamped
    pub fn is_clamped(&self, degree: usize) -> bool {
        if self.len() < 2 * (degree + 1) {
            return false;
        }
        let eps = Tolerance::epsilon();
        let n = self.len();
        let (first, last) = (self[0], self[n - 1]);
        (0..=degree).all(|i| (self[i] - first).abs() <= eps && (self[n - 1 - i] - last).abs() <= eps)
    }

    /// Find the knot span index by binary search.
    /// `n` is the index of the last control point.
    /// Parameters within epsilon of the domain end map to the last non-empty span.
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 3.), 4);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 0.), 2);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        let eps = Tolerance::epsilon();
        if u > self[n + 1] - eps {
            return n;
        }

        if u < self[degree] + eps {
            return degree;
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || u >= self[mid + 1] {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if next == mid {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Knot span of `u` for a curve of `degree` on this knot vector
    /// Fails when the vector is too short to hold a single span of `degree`.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::{KnotVector, KnotVectorError};
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.try_span(2, 1.5), Ok(3));
    /// assert_eq!(
    ///     KnotVector::new(vec![0., 1.]).try_span(2, 0.5),
    ///     Err(KnotVectorError::InvalidLength { expected: 6, actual: 2 })
    /// );
    /// ```
    pub fn try_span(&self, degree: usize, u: T) -> Result<usize, KnotVectorError> {
        let expected = 2 * (degree + 1);
        if self.len() < expected {
            return Err(KnotVectorError::InvalidLength {
                expected,
                actual: self.len(),
            });
        }
        Ok(self.span(degree, u))
    }

    /// Knot span of `u` on a knot vector already validated for `degree`
    pub(crate) fn span(&self, degree: usize, u: T) -> usize {
        debug_assert!(self.len() >= 2 * (degree + 1));
        let n = self.len() - degree - 2;
        self.find_knot_span_index(n, degree, u)
    }

    /// Compute the non-vanishing basis functions
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis_functions = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = safe_div(basis_functions[r], right[r + 1] + left[j - r]);
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }

        basis_functions
    }

    /// Compute the non-vanishing basis functions and their derivatives
    /// Returns a `(derivs + 1) x (degree + 1)` table, row `k` holds the `k`th derivative.
    /// Rows above `degree` are zero.
    pub fn derivative_basis_functions(
        &self,
        knot_span_index: usize,
        u: T,
        degree: usize,
        derivs: usize,
    ) -> Vec<Vec<T>> {
        let p = degree;
        let span = knot_span_index;
        let mut ndu = vec![vec![T::zero(); p + 1]; p + 1];
        let mut left = vec![T::zero(); p + 1];
        let mut right = vec![T::zero(); p + 1];

        ndu[0][0] = T::one();

        for j in 1..=p {
            left[j] = u - self[span + 1 - j];
            right[j] = self[span + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = safe_div(ndu[r][j - 1], ndu[j][r]);

                // upper triangle
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); p + 1]; derivs + 1];
        for j in 0..=p {
            ders[0][j] = ndu[j][p];
        }

        let du = derivs.min(p);
        let mut a = vec![vec![T::zero(); p + 1]; 2];

        for r in 0..=p {
            // alternate rows in array a
            let (mut s1, mut s2) = (0, 1);
            a[0][0] = T::one();

            for k in 1..=du {
                let mut d = T::zero();
                let rk = r as isize - k as isize;
                let pk = p - k;

                if r >= k {
                    a[s2][0] = safe_div(a[s1][0], ndu[pk + 1][r - k]);
                    d = a[s2][0] * ndu[r - k][pk];
                }

                let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
                let j2 = if r <= pk + 1 { k - 1 } else { p - r };

                for j in j1..=j2 {
                    let idx = (rk + j as isize) as usize;
                    a[s2][j] = safe_div(a[s1][j] - a[s1][j - 1], ndu[pk + 1][idx]);
                    d += a[s2][j] * ndu[idx][pk];
                }

                if r <= pk {
                    a[s2][k] = safe_div(-a[s1][k - 1], ndu[pk + 1][r]);
                    d += a[s2][k] * ndu[r][pk];
                }

                ders[k][r] = d;

                std::mem::swap(&mut s1, &mut s2);
            }
        }

        let mut factor = T::from_count(p);
        for k in 1..=du {
            for j in 0..=p {
                ders[k][j] *= factor;
            }
            factor *= T::from_count(p - k);
        }

        ders
    }

    /// Compute basis functions at `divs + 1` regularly spaced parameters over the domain
    /// Returns a tuple of parameters, knot spans and basis functions
    pub fn regularly_spaced_basis_functions(
        &self,
        degree: usize,
        divs: usize,
    ) -> (Vec<T>, Vec<usize>, Vec<Vec<T>>) {
        let n = self.len() - degree - 2;
        let (start, end) = self.domain(degree);
        let step = (end - start) / T::from_count(divs.max(1));

        let mut parameters = Vec::with_capacity(divs + 1);
        let mut bases = Vec::with_capacity(divs + 1);
        let mut knot_spans = Vec::with_capacity(divs + 1);
        let mut knot_index = self.find_knot_span_index(n, degree, start);

        for i in 0..=divs {
            let u = if i == divs {
                end
            } else {
                start + step * T::from_count(i)
            };
            while knot_index < n && u >= self[knot_index + 1] {
                knot_index += 1;
            }
            parameters.push(u);
            knot_spans.push(knot_index);
            bases.push(self.basis_functions(knot_index, u, degree));
        }

        (parameters, knot_spans, bases)
    }

    /// Cast the knot vector to another floating point type
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::new(vec![1., 2., 3., 4., 5., 6.]);
    /// let knots2 = knots.cast::<f32>();
    /// assert_eq!(knots2.first(), Some(1.0_f32));
    /// ```
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector::new(self.0.iter().map(|v| convert(*v)).collect())
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
