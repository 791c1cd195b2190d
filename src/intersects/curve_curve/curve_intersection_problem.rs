use argmin::core::{CostFunction, Gradient};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, U1};
use nalgebra::Vector2;

use crate::{curve::NurbsCurve, misc::FloatingPoint};

/// Squared distance between `a(s)` and `b(t)` over the parameter pair `(s, t)`
pub struct CurveIntersectionProblem<'a, T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    a: &'a NurbsCurve<T, D>,
    b: &'a NurbsCurve<T, D>,
}

impl<'a, T: FloatingPoint, D: DimName> CurveIntersectionProblem<'a, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    pub fn new(a: &'a NurbsCurve<T, D>, b: &'a NurbsCurve<T, D>) -> Self {
        CurveIntersectionProblem { a, b }
    }
}

impl<T: FloatingPoint, D: DimName> CostFunction for CurveIntersectionProblem<'_, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = Vector2<T>;
    type Output = T;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, anyhow::Error> {
        let p0 = self.a.point_at(param[0]);
        let p1 = self.b.point_at(param[1]);
        Ok((p0 - p1).norm_squared())
    }
}

impl<T: FloatingPoint, D: DimName> Gradient for CurveIntersectionProblem<'_, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = Vector2<T>;
    type Gradient = Vector2<T>;

    /// 2 * ( a'(s) * r, -b'(t) * r ) where r = a(s) - b(t)
    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, anyhow::Error> {
        let aderiv = self.a.rational_derivatives(param[0], 1);
        let bderiv = self.b.rational_derivatives(param[1], 1);
        let r = &aderiv[0] - &bderiv[0];
        let two = T::from_f64_lossy(2.0);
        Ok(Vector2::new(aderiv[1].dot(&r), -bderiv[1].dot(&r)) * two)
    }
}
