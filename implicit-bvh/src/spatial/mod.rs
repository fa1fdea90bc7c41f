//! The implicit bounding-volume hierarchy and its traversal engine.
//!
//! The hierarchy is a complete binary tree stored in flat arrays: nodes are
//! addressed by their 1-based breadth-first index, and positions that the
//! leaf count does not fill are virtual, i.e., skipped in storage by a small
//! amount of index arithmetic instead of being materialized.

mod bvh;
mod morton;
mod partition;
mod traverse;
mod tree;

pub use bvh::*;
pub use tree::*;

use nalgebra_glm::{RealNumber, TVec};

use crate::math::{bbox_point, bbox_ray, bsphere_point, bsphere_ray, BBox, BSphere, Ray};

/// A bounding volume that a hierarchy can be built over.
pub trait BoundingVolume<T: RealNumber, const D: usize>: Clone {
    /// Returns the smallest volume of this type enclosing both volumes.
    ///
    /// # Arguments
    /// * `other` - The volume to merge with.
    fn merge(&self, other: &Self) -> Self;

    /// Returns the center of the volume.
    fn center(&self) -> TVec<T, D>;
}

/// A trait to enable intersection tests with rays.
pub trait RayIntersectionTest<T: RealNumber, const D: usize> {
    /// Tests the intersection of the ray with the volume.
    ///
    /// # Arguments
    /// * `ray` - The ray to test the intersection with.
    fn intersects_ray(&self, ray: &Ray<T, D>) -> bool;
}

/// A trait to enable containment tests with single positions.
pub trait PointIntersectionTest<T: RealNumber, const D: usize> {
    /// Tests whether the given position lies inside the volume.
    ///
    /// # Arguments
    /// * `point` - The position to test.
    fn contains_point(&self, point: &TVec<T, D>) -> bool;
}

/// The query side of the intersection tests: anything that can be paired
/// with bounding volumes of type `B` during a traversal.
pub trait VolumeQuery<B> {
    /// Tests the query against the given bounding volume.
    ///
    /// # Arguments
    /// * `volume` - The bounding volume to test against.
    fn hits(&self, volume: &B) -> bool;
}

impl<T: RealNumber, const D: usize> BoundingVolume<T, D> for BBox<T, D> {
    #[inline]
    fn merge(&self, other: &Self) -> Self {
        BBox::merge(self, other)
    }

    #[inline]
    fn center(&self) -> TVec<T, D> {
        BBox::center(self)
    }
}

impl<T: RealNumber, const D: usize> BoundingVolume<T, D> for BSphere<T, D> {
    #[inline]
    fn merge(&self, other: &Self) -> Self {
        BSphere::merge(self, other)
    }

    #[inline]
    fn center(&self) -> TVec<T, D> {
        self.center
    }
}

impl<T: RealNumber, const D: usize> RayIntersectionTest<T, D> for BBox<T, D> {
    #[inline]
    fn intersects_ray(&self, ray: &Ray<T, D>) -> bool {
        bbox_ray(self, ray)
    }
}

impl<T: RealNumber, const D: usize> RayIntersectionTest<T, D> for BSphere<T, D> {
    #[inline]
    fn intersects_ray(&self, ray: &Ray<T, D>) -> bool {
        bsphere_ray(self, ray)
    }
}

impl<T: RealNumber, const D: usize> PointIntersectionTest<T, D> for BBox<T, D> {
    #[inline]
    fn contains_point(&self, point: &TVec<T, D>) -> bool {
        bbox_point(self, point)
    }
}

impl<T: RealNumber, const D: usize> PointIntersectionTest<T, D> for BSphere<T, D> {
    #[inline]
    fn contains_point(&self, point: &TVec<T, D>) -> bool {
        bsphere_point(self, point)
    }
}

impl<B, T: RealNumber, const D: usize> VolumeQuery<B> for Ray<T, D>
where
    B: RayIntersectionTest<T, D>,
{
    #[inline]
    fn hits(&self, volume: &B) -> bool {
        volume.intersects_ray(self)
    }
}

impl<B, T: RealNumber, const D: usize> VolumeQuery<B> for TVec<T, D>
where
    B: PointIntersectionTest<T, D>,
{
    #[inline]
    fn hits(&self, volume: &B) -> bool {
        volume.contains_point(self)
    }
}
