//! The level-synchronized traversal engine.
//!
//! The frontier of live `(node, query)` pairs is kept in a flat buffer and
//! advanced one tree level at a time: every pair whose node volume passes
//! the intersection test expands into the node's real children in a second
//! buffer, the buffers swap, and the process repeats until the leaf level
//! resolves the surviving pairs into result entries.
//!
//! Each level is split into contiguous task ranges. A task writes into its
//! own disjoint region of the destination buffer, sized for the worst-case
//! expansion of its range, and reports how many pairs it actually produced;
//! afterwards the regions are compacted into one contiguous prefix. No locks
//! or atomics are involved.

use std::ops::Range;

use log::trace;
use rayon::ThreadPool;

use crate::error::Result;
use crate::TraverseOptions;

use super::partition::partition_tasks;
use super::{Bvh, VolumeQuery};

/// One frontier entry: an implicit node index paired with a query index. In
/// the final result the node index is replaced by the index of the hit leaf
/// primitive.
pub(crate) type Pair = (u32, u32);

/// Runs a full traversal of the hierarchy for the given query batch and
/// returns all `(primitive index, query index)` hits.
pub(crate) fn traverse<B, Q>(
    bvh: &Bvh<B>,
    queries: &[Q],
    options: &TraverseOptions,
) -> Result<Vec<Pair>>
where
    B: Sync,
    Q: VolumeQuery<B> + Sync,
{
    if queries.is_empty() || bvh.leaves().is_empty() {
        return Ok(Vec::new());
    }

    let pool = if options.num_threads > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(options.num_threads)
                .build()?,
        )
    } else {
        None
    };

    let tree = bvh.tree();

    // Every query starts paired with the root.
    let mut src: Vec<Pair> = (0..queries.len() as u32).map(|query| (1, query)).collect();
    let mut dst: Vec<Pair> = Vec::new();

    for level in 1..tree.levels() {
        // Worst case, every pair expands into both children.
        dst.clear();
        dst.resize(2 * src.len(), (0, 0));

        let ranges = partition_tasks(
            src.len(),
            options.num_threads,
            options.min_traversals_per_thread,
        );

        let frontier = &src;
        let written = run_tasks(pool.as_ref(), &ranges, &mut dst, 2, |range, out| {
            expand_nodes(bvh, queries, &frontier[range], out, level)
        });

        dst.truncate(written);
        trace!("level {}: {} -> {} pairs", level, src.len(), written);

        std::mem::swap(&mut src, &mut dst);
        if src.is_empty() {
            return Ok(Vec::new());
        }
    }

    let ranges = partition_tasks(
        src.len(),
        options.num_threads,
        options.min_traversals_per_thread,
    );

    let mut results = vec![(0u32, 0u32); src.len()];
    let frontier = &src;
    let written = run_tasks(pool.as_ref(), &ranges, &mut results, 1, |range, out| {
        test_leaves(bvh, queries, &frontier[range], out)
    });

    results.truncate(written);
    trace!("leaf level: {} pairs -> {} hits", src.len(), written);

    Ok(results)
}

/// Expands one range of the frontier against the internal nodes of the
/// given level and returns the number of pairs written to `dst`.
///
/// A hit pair emits the node's left child and, unless it is virtual, the
/// right child. The left child of a real node is always real.
fn expand_nodes<B, Q: VolumeQuery<B>>(
    bvh: &Bvh<B>,
    queries: &[Q],
    src: &[Pair],
    dst: &mut [Pair],
    level: u32,
) -> usize {
    let tree = bvh.tree();
    let nodes = bvh.nodes();
    let skipped = tree.virtual_nodes_before(level);

    let mut written = 0;
    for &(implicit, query) in src {
        let node = &nodes[(implicit - skipped) as usize - 1];
        if !queries[query as usize].hits(node) {
            continue;
        }

        let left = 2 * implicit;
        dst[written] = (left, query);
        written += 1;

        if !tree.is_virtual_at(level + 1, left + 1) {
            dst[written] = (left + 1, query);
            written += 1;
        }
    }

    written
}

/// Resolves one range of leaf-level pairs into result entries and returns
/// the number of hits written to `dst`.
fn test_leaves<B, Q: VolumeQuery<B>>(
    bvh: &Bvh<B>,
    queries: &[Q],
    src: &[Pair],
    dst: &mut [Pair],
) -> usize {
    let order = bvh.order();
    let leaves = bvh.leaves();
    let first_leaf = bvh.tree().first_leaf();

    let mut written = 0;
    for &(implicit, query) in src {
        let iorder = order[(implicit - first_leaf) as usize];

        if queries[query as usize].hits(&leaves[iorder as usize]) {
            dst[written] = (iorder, query);
            written += 1;
        }
    }

    written
}

/// Runs one task per range, each writing into its own `expansion`-sized
/// region of `dst`, then compacts the regions into a contiguous prefix and
/// returns its length.
///
/// Pair order is preserved within each task, and the regions are compacted
/// in task order, so the prefix is identical to what a single sequential
/// pass over the whole frontier would produce.
fn run_tasks<F>(
    pool: Option<&ThreadPool>,
    ranges: &[Range<usize>],
    dst: &mut [Pair],
    expansion: usize,
    task: F,
) -> usize
where
    F: Fn(Range<usize>, &mut [Pair]) -> usize + Sync,
{
    // Fast path: a single task writes at offset zero and needs no
    // compaction.
    if ranges.len() == 1 {
        let range = ranges[0].clone();
        let out = &mut dst[..expansion * range.len()];
        return task(range, out);
    }

    let mut counts = vec![0usize; ranges.len()];

    match pool {
        Some(pool) => pool.scope(|scope| {
            let task = &task;
            let mut rest = &mut *dst;

            for (range, count) in ranges.iter().zip(counts.iter_mut()) {
                let (out, tail) = rest.split_at_mut(expansion * range.len());
                rest = tail;

                let range = range.clone();
                scope.spawn(move |_| *count = task(range, out));
            }
        }),
        None => {
            for (range, count) in ranges.iter().zip(counts.iter_mut()) {
                let out = &mut dst[expansion * range.start..expansion * range.end];
                *count = task(range.clone(), out);
            }
        }
    }

    // The first task's region already starts at offset zero; the written
    // tails of the remaining regions move up behind it.
    let mut write = counts[0];
    for (range, &count) in ranges.iter().zip(counts.iter()).skip(1) {
        let read = expansion * range.start;
        dst.copy_within(read..read + count, write);
        write += count;
    }

    write
}
