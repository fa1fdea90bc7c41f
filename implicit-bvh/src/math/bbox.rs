use std::fmt;
use std::fmt::Display;

use nalgebra_glm::{Number, RealNumber, TVec};
use num_traits::One;
use serde::{Deserialize, Serialize};

use super::{dist, max2, max3, min2, min3, BSphere};

/// An axis-aligned bounding box in `D` dimensions.
///
/// The box is spanned by its two corners `lo` and `up`. Every constructor
/// that derives the box from real geometry guarantees `lo[i] <= up[i]` on
/// every axis; a box built from a single position is degenerate with
/// `lo == up`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox<T: Number, const D: usize> {
    /// The corner with the lower coordinates.
    pub lo: TVec<T, D>,

    /// The corner with the upper coordinates.
    pub up: TVec<T, D>,
}

impl<T: Number, const D: usize> BBox<T, D> {
    /// Creates a new bounding box from the two given corners, stored verbatim.
    ///
    /// # Arguments
    /// * `lo` - The corner with the lower coordinates.
    /// * `up` - The corner with the upper coordinates.
    #[inline]
    pub fn new(lo: TVec<T, D>, up: TVec<T, D>) -> Self {
        Self { lo, up }
    }

    /// Creates the bounding box of the triangle spanned by the three given
    /// vertices.
    ///
    /// # Arguments
    /// * `a` - The first vertex of the triangle.
    /// * `b` - The second vertex of the triangle.
    /// * `c` - The third vertex of the triangle.
    pub fn from_triangle(a: &TVec<T, D>, b: &TVec<T, D>, c: &TVec<T, D>) -> Self {
        let lo = TVec::from_fn(|i, _| min3(a[i], b[i], c[i]));
        let up = TVec::from_fn(|i, _| max3(a[i], b[i], c[i]));

        Self { lo, up }
    }

    /// Creates the bounding box of the line segment spanned by the two given
    /// end points.
    ///
    /// # Arguments
    /// * `a` - The first end point of the segment.
    /// * `b` - The second end point of the segment.
    pub fn from_segment(a: &TVec<T, D>, b: &TVec<T, D>) -> Self {
        let lo = TVec::from_fn(|i, _| min2(a[i], b[i]));
        let up = TVec::from_fn(|i, _| max2(a[i], b[i]));

        Self { lo, up }
    }

    /// Creates the bounding box of the given vertices. Two vertices are
    /// interpreted as a line segment and three as a triangle; any other
    /// number is bounded componentwise.
    ///
    /// # Arguments
    /// * `vertices` - The vertices to bound. Must not be empty.
    pub fn from_vertices(vertices: &[TVec<T, D>]) -> Self {
        assert!(!vertices.is_empty(), "vertices must not be empty");

        match vertices {
            [a, b] => Self::from_segment(a, b),
            [a, b, c] => Self::from_triangle(a, b, c),
            _ => vertices[1..]
                .iter()
                .fold(Self::new(vertices[0], vertices[0]), |bbox, v| {
                    bbox.merge(&Self::new(*v, *v))
                }),
        }
    }

    /// Returns the smallest bounding box that contains both boxes.
    ///
    /// # Arguments
    /// * `rhs` - The right-hand-side bounding box to merge with.
    pub fn merge(&self, rhs: &Self) -> Self {
        let lo = TVec::from_fn(|i, _| min2(self.lo[i], rhs.lo[i]));
        let up = TVec::from_fn(|i, _| max2(self.up[i], rhs.up[i]));

        Self { lo, up }
    }
}

impl<T: RealNumber, const D: usize> BBox<T, D> {
    /// Creates the bounding box of the given bounding sphere.
    ///
    /// # Arguments
    /// * `sphere` - The sphere to bound.
    pub fn from_sphere(sphere: &BSphere<T, D>) -> Self {
        Self {
            lo: sphere.center.map(|x| x - sphere.radius),
            up: sphere.center.map(|x| x + sphere.radius),
        }
    }

    /// Creates the bounding box of the two given bounding spheres. If one
    /// sphere encloses the other, the result is the bounding box of the
    /// larger sphere.
    ///
    /// # Arguments
    /// * `a` - The first sphere to bound.
    /// * `b` - The second sphere to bound.
    pub fn from_spheres(a: &BSphere<T, D>, b: &BSphere<T, D>) -> Self {
        let l = dist(&a.center, &b.center);

        if l + a.radius <= b.radius {
            Self::from_sphere(b)
        } else if l + b.radius <= a.radius {
            Self::from_sphere(a)
        } else {
            let lo = TVec::from_fn(|i, _| min2(a.center[i] - a.radius, b.center[i] - b.radius));
            let up = TVec::from_fn(|i, _| max2(a.center[i] + a.radius, b.center[i] + b.radius));

            Self { lo, up }
        }
    }

    /// Computes and returns the bounding box center.
    #[inline]
    pub fn center(&self) -> TVec<T, D> {
        let half = T::one() / (T::one() + T::one());
        (self.lo + self.up) * half
    }
}

impl<T: Number, const D: usize> std::ops::Add<Self> for BBox<T, D> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        self.merge(&rhs)
    }
}

impl<T: Number + Display, const D: usize> Display for BBox<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        vec_to_string(f, &self.lo)?;
        write!(f, "-")?;
        vec_to_string(f, &self.up)
    }
}

fn vec_to_string<T: Number + Display, const D: usize>(
    f: &mut fmt::Formatter<'_>,
    v: &TVec<T, D>,
) -> fmt::Result {
    write!(f, "(")?;
    for i in 0..D {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v[i])?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod test {
    use nalgebra_glm::{vec2, vec3, Vec3};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn random_vec3(rng: &mut ChaCha8Rng) -> Vec3 {
        Vec3::new(
            rng.random_range(-10f32..10f32),
            rng.random_range(-10f32..10f32),
            rng.random_range(-10f32..10f32),
        )
    }

    fn contains(bbox: &BBox<f32, 3>, v: &Vec3) -> bool {
        (0..3).all(|i| bbox.lo[i] <= v[i] && v[i] <= bbox.up[i])
    }

    #[test]
    fn test_from_triangle_contains_vertices() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            let a = random_vec3(&mut rng);
            let b = random_vec3(&mut rng);
            let c = random_vec3(&mut rng);

            let bbox = BBox::from_triangle(&a, &b, &c);

            assert!(contains(&bbox, &a));
            assert!(contains(&bbox, &b));
            assert!(contains(&bbox, &c));
        }
    }

    #[test]
    fn test_from_segment_upper_corner() {
        let a = vec3(0f32, 5f32, -2f32);
        let b = vec3(1f32, -5f32, 4f32);

        let bbox = BBox::from_segment(&a, &b);

        assert_eq!(bbox.lo, vec3(0f32, -5f32, -2f32));
        assert_eq!(bbox.up, vec3(1f32, 5f32, 4f32));
    }

    #[test]
    fn test_degenerate_point_box() {
        let p = vec3(1f32, 2f32, 3f32);
        let bbox = BBox::from_triangle(&p, &p, &p);

        assert_eq!(bbox, BBox::new(p, p));
        assert_eq!(bbox.center(), p);
    }

    #[test]
    fn test_merge_contains_both() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..1000 {
            let a = BBox::from_segment(&random_vec3(&mut rng), &random_vec3(&mut rng));
            let b = BBox::from_segment(&random_vec3(&mut rng), &random_vec3(&mut rng));
            let c = BBox::from_segment(&random_vec3(&mut rng), &random_vec3(&mut rng));

            let merged = a.merge(&b);

            assert!(contains(&merged, &a.lo) && contains(&merged, &a.up));
            assert!(contains(&merged, &b.lo) && contains(&merged, &b.up));
            assert_eq!(merged, a + b);

            // Componentwise min/max involves no arithmetic, so commutativity
            // and associativity hold exactly.
            assert_eq!(merged, b.merge(&a));
            assert_eq!((a + b) + c, a + (b + c));
        }
    }

    #[test]
    fn test_merge_2d_uses_max_for_upper() {
        let a = BBox::new(vec2(0f32, 0f32), vec2(1f32, 1f32));
        let b = BBox::new(vec2(2f32, 2f32), vec2(3f32, 3f32));

        let merged = a.merge(&b);

        assert_eq!(merged.lo, vec2(0f32, 0f32));
        assert_eq!(merged.up, vec2(3f32, 3f32));
    }

    #[test]
    fn test_merge_integer_exact() {
        let a = BBox::new(vec3(-3i32, 0i32, 2i32), vec3(1i32, 4i32, 2i32));
        let b = BBox::new(vec3(0i32, -7i32, 0i32), vec3(0i32, 0i32, 9i32));

        let merged = a.merge(&b);

        assert_eq!(merged.lo, vec3(-3i32, -7i32, 0i32));
        assert_eq!(merged.up, vec3(1i32, 4i32, 9i32));
        assert_eq!(merged, b.merge(&a));
    }

    #[test]
    fn test_from_sphere_center_round_trip() {
        let sphere = BSphere::new(vec3(0.25f32, -1.5f32, 3f32), 1.5f32);
        let bbox = BBox::from_sphere(&sphere);

        assert_eq!(bbox.lo, vec3(-1.25f32, -3f32, 1.5f32));
        assert_eq!(bbox.up, vec3(1.75f32, 0f32, 4.5f32));
        assert_eq!(bbox.center(), sphere.center);
    }

    #[test]
    fn test_from_spheres_enclosed() {
        let a = BSphere::new(vec3(0f32, 0f32, 0f32), 5f32);
        let b = BSphere::new(vec3(1f32, 0f32, 0f32), 1f32);

        assert_eq!(BBox::from_spheres(&a, &b), BBox::from_sphere(&a));
        assert_eq!(BBox::from_spheres(&b, &a), BBox::from_sphere(&a));
    }

    #[test]
    fn test_from_spheres_disjoint() {
        let a = BSphere::new(vec3(0f32, 0f32, 0f32), 1f32);
        let b = BSphere::new(vec3(4f32, 0f32, 0f32), 2f32);

        let bbox = BBox::from_spheres(&a, &b);

        assert_eq!(bbox.lo, vec3(-1f32, -2f32, -2f32));
        assert_eq!(bbox.up, vec3(6f32, 2f32, 2f32));
    }

    #[test]
    fn test_from_vertices_dispatch() {
        let a = vec3(0f32, 0f32, 0f32);
        let b = vec3(1f32, 2f32, 3f32);
        let c = vec3(-1f32, 5f32, 1f32);
        let d = vec3(4f32, -2f32, 0f32);

        assert_eq!(BBox::from_vertices(&[a, b]), BBox::from_segment(&a, &b));
        assert_eq!(
            BBox::from_vertices(&[a, b, c]),
            BBox::from_triangle(&a, &b, &c)
        );

        let bbox = BBox::from_vertices(&[a, b, c, d]);
        assert_eq!(bbox.lo, vec3(-1f32, -2f32, 0f32));
        assert_eq!(bbox.up, vec3(4f32, 5f32, 3f32));
    }
}
