use argmin::core::{CostFunction, Gradient};
use nalgebra::{Point3, Vector1};

use crate::{
    curve::NurbsCurve3D,
    misc::{FloatingPoint, Plane},
};

/// Squared signed distance from the curve point `C(u)` to the plane
pub struct CurvePlaneIntersectionProblem<'a, T: FloatingPoint> {
    curve: &'a NurbsCurve3D<T>,
    plane: &'a Plane<T>,
}

impl<'a, T: FloatingPoint> CurvePlaneIntersectionProblem<'a, T> {
    pub fn new(curve: &'a NurbsCurve3D<T>, plane: &'a Plane<T>) -> Self {
        Self { curve, plane }
    }
}

impl<T: FloatingPoint> CostFunction for CurvePlaneIntersectionProblem<'_, T> {
    type Param = Vector1<T>;
    type Output = T;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, anyhow::Error> {
        let d = self.plane.signed_distance(&self.curve.point_at(param[0]));
        Ok(d * d)
    }
}

impl<T: FloatingPoint> Gradient for CurvePlaneIntersectionProblem<'_, T> {
    type Param = Vector1<T>;
    type Gradient = Vector1<T>;

    /// 2 * d(u) * n * C'(u)
    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, anyhow::Error> {
        let ders = self.curve.rational_derivatives(param[0], 1);
        let d = self.plane.signed_distance(&Point3::from(ders[0].clone()));
        let two = T::from_f64_lossy(2.0);
        Ok(Vector1::new(two * d * self.plane.normal().dot(&ders[1])))
    }
}
