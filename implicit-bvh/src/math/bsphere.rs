use approx::AbsDiffEq;
use nalgebra_glm::{Number, RealNumber, TVec};
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use super::{dist, BBox};

/// A bounding sphere in `D` dimensions, defined by its center and a
/// non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BSphere<T: Number, const D: usize> {
    /// The center of the sphere.
    pub center: TVec<T, D>,

    /// The radius of the sphere.
    pub radius: T,
}

impl<T: RealNumber, const D: usize> BSphere<T, D> {
    /// Creates a new bounding sphere from its center and radius, stored
    /// verbatim.
    ///
    /// # Arguments
    /// * `center` - The center of the sphere.
    /// * `radius` - The radius of the sphere.
    #[inline]
    pub fn new(center: TVec<T, D>, radius: T) -> Self {
        Self { center, radius }
    }

    /// Creates the smallest sphere enclosing the triangle spanned by the
    /// three given vertices.
    ///
    /// For a well-conditioned triangle this is the circumscribed sphere,
    /// computed from the barycentric coordinates of the circumcenter. When
    /// the circumcenter falls outside the triangle, the sphere over the
    /// diameter of the longest edge is returned instead. Collinear vertices
    /// fall back to the sphere around the vertices' bounding box.
    ///
    /// # Arguments
    /// * `a` - The first vertex of the triangle.
    /// * `b` - The second vertex of the triangle.
    /// * `c` - The third vertex of the triangle.
    pub fn from_triangle(a: &TVec<T, D>, b: &TVec<T, D>, c: &TVec<T, D>) -> Self {
        let ab = b - a;
        let ac = c - a;

        let abab = ab.dot(&ab);
        let abac = ab.dot(&ac);
        let acac = ac.dot(&ac);

        let two = T::one() + T::one();
        let d = two * (abab * acac - abac * abac);

        if d.abs() <= T::default_epsilon() {
            // The vertices are collinear. Bound their bounding box instead.
            let bbox = BBox::from_triangle(a, b, c);
            let center = bbox.center();

            Self {
                center,
                radius: dist(&center, &bbox.up),
            }
        } else {
            let s = (abab * acac - acac * abac) / d;
            let t = (acac * abab - abab * abac) / d;

            if s <= T::zero() {
                Self::from_segment(a, c)
            } else if t <= T::zero() {
                Self::from_segment(a, b)
            } else if s + t >= T::one() {
                Self::from_segment(b, c)
            } else {
                let center = a + ab * s + ac * t;

                Self {
                    center,
                    radius: dist(&center, a),
                }
            }
        }
    }

    /// Creates the sphere over the diameter of the line segment spanned by
    /// the two given end points.
    ///
    /// # Arguments
    /// * `a` - The first end point of the segment.
    /// * `b` - The second end point of the segment.
    pub fn from_segment(a: &TVec<T, D>, b: &TVec<T, D>) -> Self {
        let half = T::one() / (T::one() + T::one());
        let center = (a + b) * half;

        Self {
            center,
            radius: dist(&center, a),
        }
    }

    /// Returns the smallest sphere enclosing both spheres. If one sphere
    /// encloses the other, that sphere is returned unchanged.
    ///
    /// # Arguments
    /// * `rhs` - The right-hand-side sphere to merge with.
    pub fn merge(&self, rhs: &Self) -> Self {
        let l = dist(&self.center, &rhs.center);

        if l + self.radius <= rhs.radius {
            *rhs
        } else if l + rhs.radius <= self.radius {
            *self
        } else {
            let two = T::one() + T::one();
            let frac = ((rhs.radius - self.radius) / l + T::one()) / two;

            Self {
                center: self.center + (rhs.center - self.center) * frac,
                radius: (l + self.radius + rhs.radius) / two,
            }
        }
    }
}
