use argmin::core::{CostFunction, Gradient, Hessian};
use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector,
    U1,
};

use crate::{curve::NurbsCurve, misc::FloatingPoint};

/// Half the squared distance `|C(u) - P|^2 / 2` between a fixed point and a curve
/// The derivatives are taken with respect to the curve parameter `u`.
pub struct PointCurveDistance<'a, T: FloatingPoint, D: DimName>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    target: &'a OPoint<T, DimNameDiff<D, U1>>,
    curve: &'a NurbsCurve<T, D>,
}

impl<'a, T: FloatingPoint, D: DimName> PointCurveDistance<'a, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    pub fn new(target: &'a OPoint<T, DimNameDiff<D, U1>>, curve: &'a NurbsCurve<T, D>) -> Self {
        Self { target, curve }
    }

    /// Residual `C(u) - P` followed by the curve derivatives up to `order`
    fn residual_and_derivatives(&self, u: T, order: usize) -> Vec<OVector<T, DimNameDiff<D, U1>>> {
        let mut ders = self.curve.rational_derivatives(u, order);
        ders[0] -= &self.target.coords;
        ders
    }
}

impl<T: FloatingPoint, D: DimName> CostFunction for PointCurveDistance<'_, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = T;
    type Output = T;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, anyhow::Error> {
        let r = self.residual_and_derivatives(*param, 0);
        Ok(r[0].norm_squared() * T::from_f64_lossy(0.5))
    }
}

impl<T: FloatingPoint, D: DimName> Gradient for PointCurveDistance<'_, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = T;
    type Gradient = T;

    /// C'(u) . r
    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, anyhow::Error> {
        let r = self.residual_and_derivatives(*param, 1);
        Ok(r[1].dot(&r[0]))
    }
}

impl<T: FloatingPoint, D: DimName> Hessian for PointCurveDistance<'_, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = T;
    type Hessian = T;

    /// C''(u) . r + |C'(u)|^2
    fn hessian(&self, param: &Self::Param) -> Result<Self::Hessian, anyhow::Error> {
        let r = self.residual_and_derivatives(*param, 2);
        Ok(r[2].dot(&r[0]) + r[1].norm_squared())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use argmin::core::{CostFunction, Gradient, Hessian};
    use nalgebra::Point2;

    use super::PointCurveDistance;
    use crate::curve::NurbsCurve2D;

    #[test]
    fn derivatives_match_finite_differences() {
        let curve = NurbsCurve2D::try_from_points(
            &[
                Point2::new(0., 0.),
                Point2::new(1., 3.),
                Point2::new(3., -1.),
                Point2::new(4., 2.),
            ],
            3,
            Some(&[1., 2., 0.5, 1.]),
        )
        .unwrap();
        let target = Point2::new(2., 3.);
        let problem = PointCurveDistance::new(&target, &curve);
        let (u, h) = (0.37, 1e-6);

        let fd_gradient =
            (problem.cost(&(u + h)).unwrap() - problem.cost(&(u - h)).unwrap()) / (2. * h);
        assert_relative_eq!(problem.gradient(&u).unwrap(), fd_gradient, epsilon = 1e-5);

        let fd_hessian =
            (problem.gradient(&(u + h)).unwrap() - problem.gradient(&(u - h)).unwrap()) / (2. * h);
        assert_relative_eq!(problem.hessian(&u).unwrap(), fd_hessian, epsilon = 1e-4);
    }
}
