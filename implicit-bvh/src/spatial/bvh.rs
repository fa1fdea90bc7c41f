use log::debug;
use nalgebra_glm::{RealNumber, TVec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use simba::scalar::SubsetOf;

use crate::error::{Error, Result};
use crate::math::Ray;
use crate::TraverseOptions;

use super::morton::morton_order;
use super::traverse::traverse;
use super::tree::ImplicitTree;
use super::{BoundingVolume, PointIntersectionTest, RayIntersectionTest};

/// An implicit bounding-volume hierarchy over a set of leaf volumes.
///
/// The internal nodes live in one flat array ordered level by level and are
/// addressed by implicit index arithmetic (see [`ImplicitTree`]); the leaf
/// volumes stay in their original order and are reached through the `order`
/// permutation, which maps a position on the leaf level to the index of the
/// primitive stored there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bvh<B> {
    /// The level and virtual-node accounting of the hierarchy.
    tree: ImplicitTree,

    /// The bounding volumes of the internal nodes, level-contiguous from
    /// the root down.
    nodes: Vec<B>,

    /// The leaf volumes in their original order.
    leaves: Vec<B>,

    /// Maps a leaf-level tree position to the original leaf index.
    order: Vec<u32>,
}

impl<B> Bvh<B> {
    /// Builds a hierarchy over the given leaf volumes.
    ///
    /// The leaves are sorted into Morton order by their centers; the
    /// internal levels are then merged bottom-up so that every node encloses
    /// the volumes of its real children. A node whose right child is virtual
    /// carries its left child's volume.
    ///
    /// # Arguments
    /// * `leaves` - The leaf volumes in primitive order. Must not be empty.
    pub fn build<T, const D: usize>(leaves: Vec<B>) -> Result<Self>
    where
        B: BoundingVolume<T, D>,
        T: RealNumber + SubsetOf<f64>,
    {
        if leaves.is_empty() {
            return Err(Error::NoLeaves);
        }

        let tree = ImplicitTree::new(leaves.len() as u32);
        let order = morton_order(&leaves);

        // Rows of node volumes from the leaf level upwards. Children of the
        // k-th real node of a level sit at the offsets 2k and 2k + 1 of the
        // row below; the right child is real iff that offset exists.
        let mut rows: Vec<Vec<B>> = Vec::with_capacity(tree.levels() as usize);
        rows.push(order.iter().map(|&i| leaves[i as usize].clone()).collect());

        for level in (1..tree.levels()).rev() {
            let below = &rows[rows.len() - 1];
            let count = tree.num_real(level) as usize;

            let mut row = Vec::with_capacity(count);
            for k in 0..count {
                let left = &below[2 * k];
                row.push(match below.get(2 * k + 1) {
                    Some(right) => left.merge(right),
                    None => left.clone(),
                });
            }

            rows.push(row);
        }

        // Drop the leaf row and lay the node rows out root-first.
        let nodes: Vec<B> = rows.drain(1..).rev().flatten().collect();
        debug_assert_eq!(nodes.len(), tree.num_internal_nodes());

        debug!(
            "built hierarchy: {} leaves, {} levels, {} internal nodes",
            leaves.len(),
            tree.levels(),
            nodes.len()
        );

        Ok(Self {
            tree,
            nodes,
            leaves,
            order,
        })
    }

    /// Assembles a hierarchy from externally built parts, validating the
    /// array lengths against the tree metadata.
    ///
    /// # Arguments
    /// * `tree` - The level accounting of the hierarchy.
    /// * `nodes` - The internal node volumes, level-contiguous.
    /// * `leaves` - The leaf volumes in primitive order.
    /// * `order` - The leaf permutation.
    pub fn from_parts(
        tree: ImplicitTree,
        nodes: Vec<B>,
        leaves: Vec<B>,
        order: Vec<u32>,
    ) -> Result<Self> {
        if leaves.len() != tree.real_leaves() as usize {
            return Err(Error::LayoutMismatch {
                what: "leaf volumes",
                expected: tree.real_leaves() as usize,
                got: leaves.len(),
            });
        }

        if order.len() != leaves.len() {
            return Err(Error::LayoutMismatch {
                what: "order entries",
                expected: leaves.len(),
                got: order.len(),
            });
        }

        if nodes.len() != tree.num_internal_nodes() {
            return Err(Error::LayoutMismatch {
                what: "internal nodes",
                expected: tree.num_internal_nodes(),
                got: nodes.len(),
            });
        }

        Ok(Self {
            tree,
            nodes,
            leaves,
            order,
        })
    }

    /// Returns the level accounting of the hierarchy.
    #[inline]
    pub fn tree(&self) -> &ImplicitTree {
        &self.tree
    }

    /// Returns the internal node volumes, level-contiguous from the root.
    #[inline]
    pub fn nodes(&self) -> &[B] {
        &self.nodes
    }

    /// Returns the leaf volumes in their original order.
    #[inline]
    pub fn leaves(&self) -> &[B] {
        &self.leaves
    }

    /// Returns the permutation mapping leaf-level positions to leaf
    /// indices.
    #[inline]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Writes the hierarchy to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the hierarchy to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()>
    where
        B: Serialize,
    {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }

    /// Reads a hierarchy from the given reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the hierarchy from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self>
    where
        B: DeserializeOwned,
    {
        bincode::deserialize_from(reader).map_err(|e| Error::DeserializationError(Box::new(e)))
    }

    /// Intersects a batch of positions with the hierarchy and returns all
    /// `(primitive index, point index)` pairs whose leaf volume contains the
    /// position.
    ///
    /// The result is a deterministic function of the input; in particular it
    /// does not depend on the configured number of threads.
    ///
    /// # Arguments
    /// * `points` - The positions to test.
    /// * `options` - The traversal options.
    pub fn intersect_points<T, const D: usize>(
        &self,
        points: &[TVec<T, D>],
        options: &TraverseOptions,
    ) -> Result<Vec<(u32, u32)>>
    where
        B: PointIntersectionTest<T, D> + Sync,
        T: RealNumber + Sync,
    {
        traverse(self, points, options)
    }

    /// Intersects a batch of rays with the hierarchy and returns all
    /// `(primitive index, ray index)` pairs whose leaf volume is hit by the
    /// ray.
    ///
    /// The result is a deterministic function of the input; in particular it
    /// does not depend on the configured number of threads.
    ///
    /// # Arguments
    /// * `rays` - The rays to test.
    /// * `options` - The traversal options.
    pub fn intersect_rays<T, const D: usize>(
        &self,
        rays: &[Ray<T, D>],
        options: &TraverseOptions,
    ) -> Result<Vec<(u32, u32)>>
    where
        B: RayIntersectionTest<T, D> + Sync,
        T: RealNumber + Sync,
    {
        traverse(self, rays, options)
    }
}

#[cfg(test)]
mod test {
    use nalgebra_glm::{vec3, Vec3};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use crate::math::BBox;
    use crate::TraverseOptions;

    use super::*;

    fn random_boxes(rng: &mut ChaCha8Rng, count: usize) -> Vec<BBox<f32, 3>> {
        (0..count)
            .map(|_| {
                let center = Vec3::new(
                    rng.random_range(0f32..40f32),
                    rng.random_range(0f32..40f32),
                    rng.random_range(0f32..40f32),
                );
                let half = Vec3::new(
                    rng.random_range(0.1f32..2f32),
                    rng.random_range(0.1f32..2f32),
                    rng.random_range(0.1f32..2f32),
                );

                BBox::new(center - half, center + half)
            })
            .collect()
    }

    fn contains(outer: &BBox<f32, 3>, inner: &BBox<f32, 3>) -> bool {
        (0..3).all(|i| outer.lo[i] <= inner.lo[i] && inner.up[i] <= outer.up[i])
    }

    #[test]
    fn test_empty_leaves() {
        let leaves: Vec<BBox<f32, 3>> = Vec::new();

        assert!(matches!(Bvh::build(leaves), Err(Error::NoLeaves)));
    }

    #[test]
    fn test_order_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let bvh = Bvh::build(random_boxes(&mut rng, 57)).unwrap();

        let mut seen = vec![false; 57];
        for &i in bvh.order() {
            assert!(!seen[i as usize]);
            seen[i as usize] = true;
        }

        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_nodes_contain_children() {
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        let bvh = Bvh::build(random_boxes(&mut rng, 137)).unwrap();
        let tree = bvh.tree();

        for level in 1..tree.levels() {
            for k in 0..tree.num_real(level) {
                let implicit = (1u32 << (level - 1)) + k;
                let node = &bvh.nodes()[tree.memory_index(implicit)];

                for child in [2 * implicit, 2 * implicit + 1] {
                    if tree.is_virtual(child) {
                        continue;
                    }

                    let child_volume = if level + 1 == tree.levels() {
                        let offset = (child - tree.first_leaf()) as usize;
                        &bvh.leaves()[bvh.order()[offset] as usize]
                    } else {
                        &bvh.nodes()[tree.memory_index(child)]
                    };

                    assert!(contains(node, child_volume));
                }
            }
        }
    }

    #[test]
    fn test_from_parts_validation() {
        let mut rng = ChaCha8Rng::seed_from_u64(47);
        let bvh = Bvh::build(random_boxes(&mut rng, 12)).unwrap();

        let parts = (
            *bvh.tree(),
            bvh.nodes().to_vec(),
            bvh.leaves().to_vec(),
            bvh.order().to_vec(),
        );

        assert!(Bvh::from_parts(
            parts.0,
            parts.1.clone(),
            parts.2.clone(),
            parts.3.clone()
        )
        .is_ok());

        assert!(matches!(
            Bvh::from_parts(parts.0, parts.1.clone(), parts.2[1..].to_vec(), parts.3.clone()),
            Err(Error::LayoutMismatch { .. })
        ));

        assert!(matches!(
            Bvh::from_parts(parts.0, parts.1[1..].to_vec(), parts.2, parts.3),
            Err(Error::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(53);
        let bvh = Bvh::build(random_boxes(&mut rng, 29)).unwrap();

        let mut buffer = Vec::new();
        bvh.write(&mut buffer).unwrap();

        let restored: Bvh<BBox<f32, 3>> = Bvh::read_from(&buffer[..]).unwrap();

        assert_eq!(restored.tree(), bvh.tree());
        assert_eq!(restored.order(), bvh.order());

        let points = [vec3(20f32, 20f32, 20f32), vec3(-100f32, 0f32, 0f32)];
        let options = TraverseOptions::default();

        assert_eq!(
            restored.intersect_points(&points, &options).unwrap(),
            bvh.intersect_points(&points, &options).unwrap()
        );
    }
}
