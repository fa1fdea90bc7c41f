//! An implicit bounding-volume hierarchy for batched ray and point queries
//! against large collections of triangles (3D) or line segments (2D).
//!
//! The tree is complete and binary, so it lives in flat arrays without any
//! child pointers: node `i` has the children `2 * i` and `2 * i + 1`, and
//! positions that the leaf count does not fill are skipped by a small amount
//! of index arithmetic. Query batches are answered by a level-synchronized
//! breadth-first traversal that can fan out over a configurable number of
//! worker threads.

mod error;
pub mod math;
pub mod spatial;

pub use error::*;
pub use math::{BBox, BSphere, Ray};
pub use spatial::{
    BoundingVolume, Bvh, ImplicitTree, PointIntersectionTest, RayIntersectionTest, VolumeQuery,
};

/// The options for a traversal query batch.
#[derive(Debug, Clone)]
pub struct TraverseOptions {
    /// The number of worker threads to fan a query batch out over.
    pub num_threads: usize,

    /// The minimum number of frontier pairs a single task must process.
    /// Levels with fewer pairs than this run on fewer threads, down to a
    /// single inline pass.
    pub min_traversals_per_thread: usize,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            num_threads: 1,
            min_traversals_per_thread: 100,
        }
    }
}
