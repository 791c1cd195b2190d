use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::misc::{FloatingPoint, Jitter};

use super::BoundingBox;

/// A lazily subdivided hierarchy of bounding boxes over a parametric object
pub trait BoundingBoxTree<T: FloatingPoint, D: DimName>
where
    Self: Sized,
    DefaultAllocator: Allocator<D>,
{
    /// Bounding box of the node
    fn bounding_box(&self) -> &BoundingBox<T, D>;

    /// Parameter domain covered by the node
    fn domain(&self) -> (T, T);

    /// Check if the node can be divided further
    fn is_dividable(&self) -> bool;

    /// Divide the node into two children near the middle of its domain
    fn try_divide(&self, jitter: &mut Jitter) -> anyhow::Result<(Self, Self)>;
}
