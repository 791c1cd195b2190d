pub mod bounding_box_traversal;
pub mod bounding_box_tree;
pub mod curve_bounding_box_tree;

pub use bounding_box_traversal::*;
pub use bounding_box_tree::*;
pub use curve_bounding_box_tree::*;

use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};
use simba::scalar::SupersetOf;

use crate::{curve::NurbsCurve, misc::FloatingPoint};

/// A struct representing an axis aligned bounding box in D space.
/// A box without any point is empty, its minimum lies above its maximum.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    min: OVector<T, D>,
    max: OVector<T, D>,
}

fn far<T: FloatingPoint>() -> T {
    T::max_value().unwrap_or_else(|| T::from_f64_lossy(f64::MAX))
}

impl<T: FloatingPoint, D: DimName> BoundingBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a new bounding box from two corners given in any order.
    pub fn new(a: OVector<T, D>, b: OVector<T, D>) -> Self {
        let mut bb = Self::empty();
        bb.add_point(&OPoint::from(a));
        bb.add_point(&OPoint::from(b));
        bb
    }

    /// Create an empty bounding box
    pub fn empty() -> Self {
        let min = OVector::<T, D>::from_element(far());
        let max = -min.clone();
        Self { min, max }
    }

    /// Create a new bounding box from point iterator.
    pub fn new_with_points<I: IntoIterator<Item = OPoint<T, D>>>(iter: I) -> Self {
        let mut bb = Self::empty();
        for point in iter {
            bb.add_point(&point);
        }
        bb
    }

    /// Grow the bounding box to contain the point
    pub fn add_point(&mut self, point: &OPoint<T, D>) {
        for i in 0..D::dim() {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    /// Check if no point has been added yet
    pub fn is_empty(&self) -> bool {
        (0..D::dim()).any(|i| self.min[i] > self.max[i])
    }

    pub fn min(&self) -> &OVector<T, D> {
        &self.min
    }

    pub fn max(&self) -> &OVector<T, D> {
        &self.max
    }

    /// Check if the bounding box intersects with another bounding box.
    /// Boxes closer than `tolerance` count as intersecting, empty boxes never intersect.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use nurbs_kernel::prelude::BoundingBox;
    ///
    /// let b0 = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(b0.intersects(&b0, None));
    ///
    /// let eps = 1e-6;
    /// let b1 = BoundingBox::new(Vector3::from_element(0.5), Vector3::from_element(1.5));
    /// assert!(b0.intersects(&b1, None));
    ///
    /// let b2 = BoundingBox::new(Vector3::from_element(1. + eps), Vector3::from_element(2. + eps));
    /// assert!(!b0.intersects(&b2, None));
    /// assert!(b0.intersects(&b2, Some(2. * eps)));
    /// ```
    pub fn intersects(&self, other: &Self, tolerance: Option<T>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let tolerance = tolerance.unwrap_or(T::default_epsilon());
        (0..D::dim()).all(|i| {
            self.min[i] - tolerance <= other.max[i] && other.min[i] - tolerance <= self.max[i]
        })
    }

    /// Check if the bounding box contains a point.
    /// # Examples
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use nurbs_kernel::prelude::BoundingBox;
    /// let bb = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(bb.contains(&Point3::new(0.5, 0.5, 0.5)));
    /// assert!(bb.contains(&Point3::new(0., 0.5, 1.0)));
    /// assert!(!bb.contains(&Point3::new(-1e-8, 0.5, 0.5)));
    /// ```
    pub fn contains(&self, point: &OPoint<T, D>) -> bool {
        (0..D::dim()).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    /// Cast the bounding box to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> BoundingBox<F, D> {
        BoundingBox {
            min: self.min.clone().cast(),
            max: self.max.clone().cast(),
        }
    }

    /// Get the `2^D` corner points of the bounding box.
    pub fn corners(&self) -> Vec<OPoint<T, D>> {
        let count = 1usize << D::dim();
        (0..count)
            .map(|i| {
                let mut point = OPoint::<T, D>::origin();
                for j in 0..D::dim() {
                    point[j] = if i & (1 << j) == 0 {
                        self.min[j]
                    } else {
                        self.max[j]
                    };
                }
                point
            })
            .collect()
    }
}

impl<T: FloatingPoint, D: DimName> FromIterator<OPoint<T, D>> for BoundingBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn from_iter<I: IntoIterator<Item = OPoint<T, D>>>(iter: I) -> Self {
        Self::new_with_points(iter)
    }
}

/// The convex hull property puts the whole curve inside the box of its control points
impl<'a, T: FloatingPoint, D: DimName> From<&'a NurbsCurve<T, D>>
    for BoundingBox<T, DimNameDiff<D, U1>>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn from(value: &'a NurbsCurve<T, D>) -> Self {
        Self::new_with_points(value.dehomogenized_control_points())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point2, Vector2};

    use super::BoundingBox;
    use crate::prelude::*;

    #[test]
    fn empty_box_grows_with_points() {
        let mut bb = BoundingBox::<f64, nalgebra::U2>::empty();
        assert!(bb.is_empty());
        assert!(!bb.intersects(&bb, Some(1.)));
        bb.add_point(&Point2::new(1., -1.));
        assert!(!bb.is_empty());
        bb.add_point(&Point2::new(-2., 3.));
        assert_eq!(bb.min(), &Vector2::new(-2., -1.));
        assert_eq!(bb.max(), &Vector2::new(1., 3.));
        assert_eq!(bb.corners().len(), 4);
        assert!(bb.corners().iter().all(|c| bb.contains(c)));
    }

    #[test]
    fn curve_box_contains_samples() {
        let curve = NurbsCurve2D::try_from_points(
            &[
                Point2::new(0., 0.),
                Point2::new(1., 3.),
                Point2::new(4., -2.),
                Point2::new(5., 1.),
            ],
            3,
            Some(&[1., 3., 0.5, 1.]),
        )
        .unwrap();
        let bb = BoundingBox::from(&curve);
        for i in 0..=50 {
            let p = curve.point_at(i as f64 / 50.);
            assert!(bb.contains(&p));
        }
    }
}
