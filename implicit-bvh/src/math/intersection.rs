use nalgebra_glm::{Number, RealNumber, TVec};
use num_traits::{One, Zero};

use super::{dist_sq, max2, min2, BBox, BSphere, Ray};

/// Determines whether the given ray intersects the bounding box, using the
/// slab method: the ray's parameter interval is clipped against the two
/// planes of each axis and the box is hit if the folded interval stays
/// non-empty and reaches forward along the ray.
///
/// An axis-parallel ray divides by zero, which yields signed infinities that
/// flow through the interval folding correctly: a parallel ray outside the
/// slab folds `tmin` to infinity and misses.
///
/// # Arguments
/// * `bbox` - The bounding box to test.
/// * `ray` - The ray to test.
pub fn bbox_ray<T: RealNumber, const D: usize>(bbox: &BBox<T, D>, ray: &Ray<T, D>) -> bool {
    let inv_d = ray.dir.map(|d| T::one() / d);

    let t1 = (bbox.lo[0] - ray.pos[0]) * inv_d[0];
    let t2 = (bbox.up[0] - ray.pos[0]) * inv_d[0];

    let mut tmin = min2(t1, t2);
    let mut tmax = max2(t1, t2);

    for i in 1..D {
        let t1 = (bbox.lo[i] - ray.pos[i]) * inv_d[i];
        let t2 = (bbox.up[i] - ray.pos[i]) * inv_d[i];

        tmin = max2(tmin, min2(t1, t2));
        tmax = min2(tmax, max2(t1, t2));
    }

    // The second clause rejects boxes that lie entirely behind the ray.
    tmin <= tmax && tmax >= T::zero()
}

/// Determines whether the given ray intersects the bounding sphere, by
/// examining the discriminant of `||pos + t * dir - center||^2 = radius^2`.
/// No root is extracted: a ray starting inside the sphere always hits, and
/// an outside ray hits if the roots lie forward, i.e. `b <= 0`.
///
/// # Arguments
/// * `sphere` - The bounding sphere to test.
/// * `ray` - The ray to test.
pub fn bsphere_ray<T: RealNumber, const D: usize>(sphere: &BSphere<T, D>, ray: &Ray<T, D>) -> bool {
    let two = T::one() + T::one();
    let four = two * two;

    let pc = ray.pos - sphere.center;

    let a = ray.dir.dot(&ray.dir);
    let b = pc.dot(&ray.dir) * two;
    let c = pc.dot(&pc) - sphere.radius * sphere.radius;

    let delta = b * b - four * a * c;

    if delta < T::zero() {
        false
    } else {
        c <= T::zero() || b <= T::zero()
    }
}

/// Determines whether the given position lies inside or on the boundary of
/// the bounding box.
///
/// # Arguments
/// * `bbox` - The bounding box to test.
/// * `point` - The position to test.
#[inline]
pub fn bbox_point<T: Number, const D: usize>(bbox: &BBox<T, D>, point: &TVec<T, D>) -> bool {
    (0..D).all(|i| bbox.lo[i] <= point[i] && point[i] <= bbox.up[i])
}

/// Determines whether the given position lies strictly inside the bounding
/// sphere. A position exactly on the surface does not count as a hit.
///
/// # Arguments
/// * `sphere` - The bounding sphere to test.
/// * `point` - The position to test.
#[inline]
pub fn bsphere_point<T: RealNumber, const D: usize>(
    sphere: &BSphere<T, D>,
    point: &TVec<T, D>,
) -> bool {
    dist_sq(point, &sphere.center) < sphere.radius * sphere.radius
}
