pub mod clamped_newton;
pub mod point_curve_distance;

pub use clamped_newton::*;
pub use point_curve_distance::*;

use argmin::core::{ArgminFloat, Executor, State};
use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, U1,
};

use crate::{
    curve::NurbsCurve,
    misc::{segment_closest_point, FloatingPoint, Tolerance},
};

/// Newton iterations after the coarse polyline guess
const CLOSEST_PARAMETER_MAX_ITERS: u64 = 8;

impl<T: FloatingPoint + ArgminFloat, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Find the closest point on the curve to a given point
    pub fn find_closest_point(
        &self,
        point: &OPoint<T, DimNameDiff<D, U1>>,
    ) -> anyhow::Result<OPoint<T, DimNameDiff<D, U1>>> {
        self.find_closest_parameter(point).map(|u| self.point_at(u))
    }

    /// Find the closest parameter on the curve to a given point
    /// A coarse polyline sample picks the starting parameter, then Newton's method refines it
    /// while keeping the parameter inside the domain.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let line = NurbsCurve2D::try_polyline(&[Point2::new(0., 0.), Point2::new(10., 0.)]).unwrap();
    /// let u = line.find_closest_parameter(&Point2::new(2.5, 3.)).unwrap();
    /// assert_relative_eq!(u, 0.25, epsilon = 1e-8);
    /// let u = line.find_closest_parameter(&Point2::new(-4., 1.)).unwrap();
    /// assert_relative_eq!(u, 0.);
    /// ```
    pub fn find_closest_parameter(&self, point: &OPoint<T, DimNameDiff<D, U1>>) -> anyhow::Result<T> {
        let (min_u, max_u) = self.knots_domain();
        let samples = (self.control_points().len() * self.degree()).max(2);
        let step = (max_u - min_u) / T::from_count(samples - 1);
        let polyline: Vec<_> = (0..samples)
            .map(|i| {
                let u = if i == samples - 1 {
                    max_u
                } else {
                    min_u + step * T::from_count(i)
                };
                (u, self.point_at(u))
            })
            .collect();

        let guess = polyline
            .windows(2)
            .map(|w| {
                let (u, projected) = segment_closest_point(point, &w[0].1, &w[1].1, w[0].0, w[1].0);
                (u, (point - projected).norm_squared())
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(u, _)| u)
            .unwrap_or(min_u);

        let solver = ClampedNewton::new((min_u, max_u)).with_tolerance(Tolerance::epsilon());
        let res = Executor::new(PointCurveDistance::new(point, self), solver)
            .configure(|state| state.param(guess).max_iters(CLOSEST_PARAMETER_MAX_ITERS))
            .run()?;
        res.state()
            .get_best_param()
            .cloned()
            .ok_or(anyhow::anyhow!("No best parameter found"))
    }
}
