use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::misc::FloatingPoint;

/// A point on a curve with the parameter it was evaluated at
#[derive(Clone, Debug, PartialEq)]
pub struct SampledPoint<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    parameter: T,
    point: OPoint<T, D>,
}

impl<T: FloatingPoint, D: DimName> SampledPoint<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn new(parameter: T, point: OPoint<T, D>) -> Self {
        Self { parameter, point }
    }

    pub fn parameter(&self) -> T {
        self.parameter
    }

    pub fn point(&self) -> &OPoint<T, D> {
        &self.point
    }

    pub fn into_tuple(self) -> (T, OPoint<T, D>) {
        (self.parameter, self.point)
    }
}
