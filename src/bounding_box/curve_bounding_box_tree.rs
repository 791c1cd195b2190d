use std::borrow::Cow;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, U1};

use crate::{
    curve::NurbsCurve,
    misc::{FloatingPoint, Jitter},
    split::Split,
};

use super::{BoundingBox, BoundingBoxTree};

/// Default number of leaves a curve domain is divided into
pub const DEFAULT_KNOT_DIVISION: usize = 64;

/// A bounding box tree node over a curve segment
#[derive(Clone, Debug)]
pub struct CurveBoundingBoxTree<'a, T: FloatingPoint, D: DimName>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    curve: Cow<'a, NurbsCurve<T, D>>,
    tolerance: T,
    bounding_box: BoundingBox<T, DimNameDiff<D, U1>>,
}

impl<'a, T: FloatingPoint, D: DimName> CurveBoundingBoxTree<'a, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a new bounding box tree from a curve.
    /// `tolerance` is the knot domain length below which a node is a leaf,
    /// the domain divided by 64 when omitted.
    pub fn new(curve: &'a NurbsCurve<T, D>, tolerance: Option<T>) -> Self {
        let tol = tolerance.unwrap_or_else(|| {
            curve.knots_domain_interval() / T::from_count(DEFAULT_KNOT_DIVISION)
        });
        Self::with_curve(Cow::Borrowed(curve), tol)
    }

    fn with_curve(curve: Cow<'a, NurbsCurve<T, D>>, tolerance: T) -> Self {
        let bounding_box = BoundingBox::from(curve.as_ref());
        Self {
            curve,
            tolerance,
            bounding_box,
        }
    }

    pub fn curve(&self) -> &NurbsCurve<T, D> {
        self.curve.as_ref()
    }

    pub fn curve_owned(self) -> NurbsCurve<T, D> {
        self.curve.into_owned()
    }

    pub fn tolerance(&self) -> T {
        self.tolerance
    }
}

impl<T: FloatingPoint, D: DimName> BoundingBoxTree<T, DimNameDiff<D, U1>>
    for CurveBoundingBoxTree<'_, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn bounding_box(&self) -> &BoundingBox<T, DimNameDiff<D, U1>> {
        &self.bounding_box
    }

    fn domain(&self) -> (T, T) {
        self.curve.knots_domain()
    }

    /// Check if the curve is dividable or not.
    fn is_dividable(&self) -> bool {
        let interval = self.curve.knots_domain_interval();
        interval > self.tolerance || {
            match self.curve.degree() {
                1 => {
                    // A polyline crossing another curve close to one of its corners
                    // can hide two intersections inside a single leaf:
                    //   |     /
                    //   |    /
                    // --+--+------- <- intersected at 2 points
                    //   | /
                    //   |/
                    // so a polyline leaf never holds more than two control points.
                    interval >= T::from_f64_lossy(1e-4) && self.curve.control_points().len() >= 3
                }
                _ => false,
            }
        }
    }

    /// Split the curve at `0.5 ± 0.1` of its domain
    fn try_divide(&self, jitter: &mut Jitter) -> anyhow::Result<(Self, Self)> {
        let (min, max) = self.curve.knots_domain();
        let interval = max - min;
        let ratio = T::from_f64_lossy(0.5) + T::from_f64_lossy(0.1) * jitter.signed_sample::<T>();
        let (head, tail) = self.curve.try_split(min + interval * ratio)?;
        Ok((
            Self::with_curve(Cow::Owned(head), self.tolerance),
            Self::with_curve(Cow::Owned(tail), self.tolerance),
        ))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use crate::prelude::*;

    #[test]
    fn children_cover_the_parent_domain() {
        let curve = NurbsCurve2D::try_from_points(
            &[
                Point2::new(0., 0.),
                Point2::new(1., 3.),
                Point2::new(4., -2.),
                Point2::new(5., 1.),
            ],
            3,
            None,
        )
        .unwrap();
        let tree = CurveBoundingBoxTree::new(&curve, None);
        assert!(tree.is_dividable());
        let mut jitter = Jitter::seeded();
        let (a, b) = tree.try_divide(&mut jitter).unwrap();
        assert_eq!(a.domain().0, 0.);
        assert_eq!(a.domain().1, b.domain().0);
        assert_eq!(b.domain().1, 1.);
        let mid = a.domain().1;
        assert!((0.4..=0.6).contains(&mid));
        assert!(tree.bounding_box().contains(&a.bounding_box().min().clone().into()));
        assert!(tree.bounding_box().contains(&b.bounding_box().max().clone().into()));
    }

    #[test]
    fn leaf_below_tolerance() {
        let curve = NurbsCurve2D::try_from_points(
            &[Point2::new(0., 0.), Point2::new(1., 3.), Point2::new(4., -2.)],
            2,
            None,
        )
        .unwrap();
        let tree = CurveBoundingBoxTree::new(&curve, Some(2.));
        assert!(!tree.is_dividable());
    }
}
