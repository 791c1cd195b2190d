use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};

use crate::{
    curve::{dehomogenize, NurbsCurve},
    misc::{three_points_are_flat, FloatingPoint, Jitter, Tolerance},
};

use super::{SampledPoint, Tessellation};

/// Subdivision depth beyond which adaptive sampling accepts a segment as linear
pub const MAX_SAMPLING_DEPTH: usize = 32;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Sample `samples` equally spaced parameters over the domain, both ends included
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(2., 0.)],
    ///     2,
    ///     None,
    /// ).unwrap();
    /// let samples = curve.try_sample_regular(5).unwrap();
    /// assert_eq!(samples.len(), 5);
    /// assert_relative_eq!(samples[2].parameter(), 0.5);
    /// assert_relative_eq!(samples[2].point(), &Point2::new(1., 1.));
    /// ```
    pub fn try_sample_regular(
        &self,
        samples: usize,
    ) -> anyhow::Result<Vec<SampledPoint<T, DimNameDiff<D, U1>>>> {
        anyhow::ensure!(samples >= 2, "At least two samples are required");

        let degree = self.degree();
        let (parameters, spans, bases) = self
            .knots()
            .regularly_spaced_basis_functions(degree, samples - 1);

        parameters
            .into_iter()
            .zip(spans)
            .zip(bases)
            .map(|((u, span), basis)| {
                let offset = span - degree;
                let coords = basis.iter().enumerate().fold(
                    OVector::<T, D>::zeros(),
                    |acc, (j, b)| acc + &self.control_points()[offset + j].coords * *b,
                );
                let point = dehomogenize(&OPoint::from(coords))
                    .ok_or_else(|| anyhow::anyhow!("Curve has a zero weight at {:?}", u))?;
                Ok(SampledPoint::new(u, point))
            })
            .collect()
    }

    /// Sample the curve adaptively with the default seeded jitter
    /// Segments are subdivided until they are flat within `tolerance`.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    ///
    /// let curve = NurbsCurve2D::try_from_points(
    ///     &[Point2::new(0., 0.), Point2::new(1., 2.), Point2::new(3., -2.), Point2::new(4., 0.)],
    ///     3,
    ///     None,
    /// ).unwrap();
    /// let coarse = curve.sample_adaptive(1e-1);
    /// let fine = curve.sample_adaptive(1e-4);
    /// assert!(fine.len() > coarse.len());
    /// assert!(fine.windows(2).all(|w| w[0].parameter() < w[1].parameter()));
    /// ```
    pub fn sample_adaptive(&self, tolerance: T) -> Vec<SampledPoint<T, DimNameDiff<D, U1>>> {
        let mut jitter = Jitter::seeded();
        self.sample_adaptive_with_jitter(tolerance, &mut jitter)
    }

    /// Sample the curve adaptively, drawing interior test parameters from `jitter`
    /// Degree 1 curves return their control points.
    pub fn sample_adaptive_with_jitter(
        &self,
        tolerance: T,
        jitter: &mut Jitter,
    ) -> Vec<SampledPoint<T, DimNameDiff<D, U1>>> {
        if self.degree() == 1 {
            let knots = self.knots();
            return self
                .control_points()
                .iter()
                .enumerate()
                .filter_map(|(i, p)| dehomogenize(p).map(|p| SampledPoint::new(knots[i + 1], p)))
                .collect();
        }

        let (start, end) = self.knots_domain();
        let min_delta = T::from_f64_lossy(1e-8);
        let half = T::from_f64_lossy(0.5);
        let lower = T::from_f64_lossy(0.45);
        let width = T::from_f64_lossy(0.1);

        let mut samples = vec![];
        let mut stack = vec![(start, end, 0)];

        while let Some((s, e, depth)) = stack.pop() {
            let p1 = self.point_at(s);
            let p3 = self.point_at(e);
            let delta = e - s;

            let subdivide = if delta < min_delta || depth >= MAX_SAMPLING_DEPTH {
                false
            } else {
                let t = lower + width * jitter.sample::<T>();
                let p2 = self.point_at(s + delta * t);
                let diff = &p1 - &p3;
                let diff2 = &p1 - &p2;
                (diff.norm_squared() < tolerance && diff2.norm_squared() > tolerance)
                    || !three_points_are_flat(&p1, &p2, &p3, tolerance)
            };

            if subdivide {
                let mid = s + delta * half;
                stack.push((mid, e, depth + 1));
                stack.push((s, mid, depth + 1));
            } else {
                if samples.is_empty() {
                    samples.push(SampledPoint::new(s, p1));
                }
                samples.push(SampledPoint::new(e, p3));
            }
        }

        samples
    }
}

impl<T: FloatingPoint, D: DimName> Tessellation<Option<T>> for NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Output = Vec<OPoint<T, DimNameDiff<D, U1>>>;

    /// Tessellate the curve into a polyline using adaptive sampling
    /// The tolerance defaults to `Tolerance::MAX_TOLERANCE`.
    fn tessellate(&self, tolerance: Option<T>) -> Self::Output {
        let tol = tolerance.unwrap_or(Tolerance::max_tolerance());
        self.sample_adaptive(tol)
            .into_iter()
            .map(|s| s.into_tuple().1)
            .collect()
    }
}
