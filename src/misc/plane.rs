use nalgebra::{convert, Point3, Vector3};
use simba::scalar::SupersetOf;

use crate::misc::FloatingPoint;

/// A plane in 3D space, `normal . p + constant = 0` with a unit `normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T: FloatingPoint> {
    normal: Vector3<T>,
    constant: T,
}

impl<T: FloatingPoint> Plane<T> {
    /// Create a plane from a normal and a constant.
    /// The pair is rescaled so that the stored normal has unit length.
    pub fn try_new(normal: Vector3<T>, constant: T) -> anyhow::Result<Self> {
        let length = normal.norm();
        anyhow::ensure!(
            length > T::default_epsilon() && length.is_finite(),
            "Plane normal must be a finite non-zero vector"
        );
        Ok(Self {
            normal: normal / length,
            constant: constant / length,
        })
    }

    /// Create a plane passing through `origin` with the given `normal`
    pub fn try_from_origin_normal(origin: &Point3<T>, normal: Vector3<T>) -> anyhow::Result<Self> {
        let plane = Self::try_new(normal, T::zero())?;
        let constant = -plane.normal.dot(&origin.coords);
        Ok(Self { constant, ..plane })
    }

    pub fn normal(&self) -> Vector3<T> {
        self.normal
    }

    pub fn constant(&self) -> T {
        self.constant
    }

    /// The point on the plane closest to the world origin
    pub fn origin(&self) -> Point3<T> {
        Point3::from(self.normal * -self.constant)
    }

    /// Calculate the signed distance from a point to the plane.
    pub fn signed_distance(&self, point: &Point3<T>) -> T {
        self.normal.dot(&point.coords) + self.constant
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project(&self, point: &Point3<T>) -> Point3<T> {
        point - self.normal * self.signed_distance(point)
    }

    /// In-plane orthonormal axes `(u, v)` with `u x v = normal`
    pub fn frame(&self) -> (Vector3<T>, Vector3<T>) {
        let n = self.normal;
        // seed with the world axis least aligned to the normal
        let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vector3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = (seed - n * n.dot(&seed)).normalize();
        let v = n.cross(&u);
        (u, v)
    }

    /// Coordinates of a point's projection in the plane's own `(u, v)` frame
    pub fn plane_coordinates(&self, point: &Point3<T>) -> (T, T) {
        let (u, v) = self.frame();
        let rel = self.project(point) - self.origin();
        (rel.dot(&u), rel.dot(&v))
    }

    /// Cast the plane to a different floating point type.
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Plane<F> {
        Plane {
            normal: self.normal.cast(),
            constant: convert(self.constant),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use super::Plane;

    #[test]
    fn normal_is_rescaled() {
        let plane = Plane::try_new(Vector3::new(0., 0., 2.), -4.).unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z());
        assert_relative_eq!(plane.constant(), -2.);
        assert_relative_eq!(plane.signed_distance(&Point3::new(5., 5., 3.)), 1.);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::try_new(Vector3::<f64>::zeros(), 1.).is_err());
    }

    #[test]
    fn frame_is_orthonormal() {
        let plane =
            Plane::try_from_origin_normal(&Point3::new(1., 2., 3.), Vector3::new(1., 1., 0.))
                .unwrap();
        let (u, v) = plane.frame();
        let n = plane.normal();
        assert_relative_eq!(u.norm(), 1., epsilon = 1e-12);
        assert_relative_eq!(v.norm(), 1., epsilon = 1e-12);
        assert_relative_eq!(u.dot(&v), 0., epsilon = 1e-12);
        assert_relative_eq!(u.dot(&n), 0., epsilon = 1e-12);
        assert_relative_eq!(u.cross(&v), n, epsilon = 1e-12);
    }

    #[test]
    fn projection_lies_on_plane() {
        let plane = Plane::try_from_origin_normal(&Point3::new(0., 0., 1.), Vector3::z()).unwrap();
        let p = Point3::new(3., -2., 7.);
        let q = plane.project(&p);
        assert_relative_eq!(plane.signed_distance(&q), 0., epsilon = 1e-12);
        let (u, v) = plane.plane_coordinates(&p);
        let (fu, fv) = plane.frame();
        assert_relative_eq!(plane.origin() + fu * u + fv * v, q, epsilon = 1e-12);
    }
}
