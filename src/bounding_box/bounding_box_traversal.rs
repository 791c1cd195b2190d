use std::marker::PhantomData;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::misc::{FloatingPoint, Jitter, Tolerance};

use super::BoundingBoxTree;

/// Maximum number of node pairs waiting in the traversal worklist
pub const MAX_TRAVERSAL_PAIRS: usize = 1 << 16;

/// Pairs of leaves whose bounding boxes overlap
pub struct BoundingBoxTraversal<T, D, A, B> {
    pairs: Vec<(A, B)>,
    _marker: PhantomData<(T, D)>,
}

/// Worklist item of the self traversal
enum SelfNode<N> {
    Single(N),
    Pair(N, N),
}

impl<T: FloatingPoint, D: DimName, A, B> BoundingBoxTraversal<T, D, A, B>
where
    DefaultAllocator: Allocator<D>,
    A: BoundingBoxTree<T, D> + Clone,
    B: BoundingBoxTree<T, D> + Clone,
{
    /// Try to traverse bounding box tree pairs to find pairs of intersecting leaves.
    pub fn try_traverse(a: A, b: B, jitter: &mut Jitter) -> anyhow::Result<Self> {
        let mut trees = vec![(a, b)];
        let mut pairs = vec![];

        let tol = Some(T::zero());

        while let Some((a, b)) = trees.pop() {
            if !a.bounding_box().intersects(b.bounding_box(), tol) {
                continue;
            }

            match (a.is_dividable(), b.is_dividable()) {
                (false, false) => {
                    pairs.push((a, b));
                }
                (true, false) => {
                    let (a0, a1) = a.try_divide(jitter)?;
                    trees.push((a0, b.clone()));
                    trees.push((a1, b));
                }
                (false, true) => {
                    let (b0, b1) = b.try_divide(jitter)?;
                    trees.push((a.clone(), b0));
                    trees.push((a, b1));
                }
                (true, true) => {
                    let (a0, a1) = a.try_divide(jitter)?;
                    let (b0, b1) = b.try_divide(jitter)?;
                    trees.push((a0.clone(), b0.clone()));
                    trees.push((a1.clone(), b0));
                    trees.push((a0, b1.clone()));
                    trees.push((a1, b1));
                }
            };

            anyhow::ensure!(
                trees.len() <= MAX_TRAVERSAL_PAIRS,
                "Bounding box traversal exceeded {} pending pairs",
                MAX_TRAVERSAL_PAIRS
            );
        }

        log::debug!("bounding box traversal found {} leaf pairs", pairs.len());

        Ok(Self {
            pairs,
            _marker: PhantomData,
        })
    }

    pub fn pairs(&self) -> &[(A, B)] {
        &self.pairs
    }

    pub fn pairs_iter(&self) -> impl Iterator<Item = &(A, B)> {
        self.pairs.iter()
    }

    pub fn into_pairs(self) -> Vec<(A, B)> {
        self.pairs
    }

    pub fn into_pairs_iter(self) -> impl Iterator<Item = (A, B)> {
        self.pairs.into_iter()
    }
}

impl<T: FloatingPoint, D: DimName, A> BoundingBoxTraversal<T, D, A, A>
where
    DefaultAllocator: Allocator<D>,
    A: BoundingBoxTree<T, D> + Clone,
{
    /// Traverse a single tree against itself to find overlapping leaves of distinct parts.
    /// Leaves sharing a domain end are neighbours along the object and are skipped.
    pub fn try_traverse_self(tree: A, jitter: &mut Jitter) -> anyhow::Result<Self> {
        let eps = Tolerance::epsilon::<T>();
        let adjacent = |a: &A, b: &A| {
            let (a0, a1) = a.domain();
            let (b0, b1) = b.domain();
            (a1 - b0).abs() <= eps || (b1 - a0).abs() <= eps
        };

        let mut nodes = vec![SelfNode::Single(tree)];
        let mut pairs = vec![];
        let tol = Some(T::zero());

        while let Some(node) = nodes.pop() {
            match node {
                SelfNode::Single(n) => {
                    if n.is_dividable() {
                        let (n0, n1) = n.try_divide(jitter)?;
                        nodes.push(SelfNode::Pair(n0.clone(), n1.clone()));
                        nodes.push(SelfNode::Single(n0));
                        nodes.push(SelfNode::Single(n1));
                    }
                }
                SelfNode::Pair(a, b) => {
                    if !a.bounding_box().intersects(b.bounding_box(), tol) {
                        continue;
                    }
                    match (a.is_dividable(), b.is_dividable()) {
                        (false, false) => {
                            if !adjacent(&a, &b) {
                                pairs.push((a, b));
                            }
                        }
                        (true, false) => {
                            let (a0, a1) = a.try_divide(jitter)?;
                            nodes.push(SelfNode::Pair(a0, b.clone()));
                            nodes.push(SelfNode::Pair(a1, b));
                        }
                        (false, true) => {
                            let (b0, b1) = b.try_divide(jitter)?;
                            nodes.push(SelfNode::Pair(a.clone(), b0));
                            nodes.push(SelfNode::Pair(a, b1));
                        }
                        (true, true) => {
                            let (a0, a1) = a.try_divide(jitter)?;
                            let (b0, b1) = b.try_divide(jitter)?;
                            nodes.push(SelfNode::Pair(a0.clone(), b0.clone()));
                            nodes.push(SelfNode::Pair(a1.clone(), b0));
                            nodes.push(SelfNode::Pair(a0, b1.clone()));
                            nodes.push(SelfNode::Pair(a1, b1));
                        }
                    }
                }
            }

            anyhow::ensure!(
                nodes.len() <= MAX_TRAVERSAL_PAIRS,
                "Bounding box traversal exceeded {} pending pairs",
                MAX_TRAVERSAL_PAIRS
            );
        }

        log::debug!("self traversal found {} leaf pairs", pairs.len());

        Ok(Self {
            pairs,
            _marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use crate::prelude::*;

    fn curve(points: &[(f64, f64)]) -> NurbsCurve2D<f64> {
        let points: Vec<_> = points.iter().map(|(x, y)| Point2::new(*x, *y)).collect();
        NurbsCurve2D::try_from_points(&points, 3, None).unwrap()
    }

    #[test]
    fn disjoint_curves_have_no_pairs() {
        let a = curve(&[(0., 0.), (1., 1.), (2., 1.), (3., 0.)]);
        let b = curve(&[(0., 5.), (1., 6.), (2., 6.), (3., 5.)]);
        let mut jitter = Jitter::seeded();
        let traversal = BoundingBoxTraversal::try_traverse(
            CurveBoundingBoxTree::new(&a, None),
            CurveBoundingBoxTree::new(&b, None),
            &mut jitter,
        )
        .unwrap();
        assert!(traversal.pairs().is_empty());
    }

    #[test]
    fn crossing_curves_have_overlapping_leaves() {
        let a = curve(&[(0., 0.), (1., 1.), (2., 1.), (3., 0.)]);
        let b = curve(&[(0., 1.), (1., 0.), (2., 0.), (3., 1.)]);
        let mut jitter = Jitter::seeded();
        let traversal = BoundingBoxTraversal::try_traverse(
            CurveBoundingBoxTree::new(&a, None),
            CurveBoundingBoxTree::new(&b, None),
            &mut jitter,
        )
        .unwrap();
        assert!(!traversal.pairs().is_empty());
        for (la, lb) in traversal.pairs_iter() {
            assert!(!la.is_dividable());
            assert!(!lb.is_dividable());
            assert!(la.bounding_box().intersects(lb.bounding_box(), Some(0.)));
        }
    }

    #[test]
    fn self_traversal_skips_neighbours() {
        let arc = curve(&[(0., 0.), (1., 1.), (2., 1.), (3., 0.)]);
        let mut jitter = Jitter::seeded();
        let traversal =
            BoundingBoxTraversal::try_traverse_self(CurveBoundingBoxTree::new(&arc, None), &mut jitter)
                .unwrap();
        assert!(traversal.pairs().is_empty());

        let looped = curve(&[(0., 0.), (15., 10.), (-5., 10.), (10., 0.)]);
        let traversal = BoundingBoxTraversal::try_traverse_self(
            CurveBoundingBoxTree::new(&looped, None),
            &mut jitter,
        )
        .unwrap();
        assert!(!traversal.pairs().is_empty());
    }
}
