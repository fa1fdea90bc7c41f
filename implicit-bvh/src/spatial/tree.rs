use serde::{Deserialize, Serialize};

/// The level and virtual-node accounting of an implicit complete binary
/// tree over a fixed number of leaves.
///
/// Nodes are numbered breadth-first starting with the root at 1; the
/// children of node `i` are `2 * i` and `2 * i + 1`, and level `l`
/// (1 = root) spans the indices `[2^(l - 1), 2^l - 1]`. Since the number of
/// leaves is rarely a power of two, the trailing positions of each level are
/// virtual: they carry no stored volume and are skipped when an implicit
/// index is converted into an index into the flat node array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplicitTree {
    levels: u32,
    real_leaves: u32,
    virtual_leaves: u32,
}

impl ImplicitTree {
    /// Creates the accounting for a tree over the given number of leaves.
    ///
    /// # Arguments
    /// * `num_leaves` - The number of real leaves. Must be positive.
    pub fn new(num_leaves: u32) -> Self {
        debug_assert!(num_leaves > 0, "a tree needs at least one leaf");

        let levels = num_leaves.next_power_of_two().trailing_zeros() + 1;
        let virtual_leaves = (1u32 << (levels - 1)) - num_leaves;

        Self {
            levels,
            real_leaves: num_leaves,
            virtual_leaves,
        }
    }

    /// The total depth of the tree, including the root and the leaf level.
    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// The number of real leaves.
    #[inline]
    pub fn real_leaves(&self) -> u32 {
        self.real_leaves
    }

    /// The number of virtual leaf positions padding the leaf level to the
    /// next power of two.
    #[inline]
    pub fn virtual_leaves(&self) -> u32 {
        self.virtual_leaves
    }

    /// Returns the level of the given implicit index, where the root is on
    /// level 1.
    #[inline]
    pub fn level_of(implicit: u32) -> u32 {
        implicit.ilog2() + 1
    }

    /// Returns the number of virtual positions on the given level.
    #[inline]
    pub fn num_virtual(&self, level: u32) -> u32 {
        shr_or_zero(self.virtual_leaves, self.levels - level)
    }

    /// Returns the number of real positions on the given level.
    #[inline]
    pub fn num_real(&self, level: u32) -> u32 {
        (1u32 << (level - 1)) - self.num_virtual(level)
    }

    /// Returns the number of virtual positions on all levels strictly above
    /// the given level. Subtracting it from an implicit index on that level
    /// yields the 1-based storage position of the node.
    #[inline]
    pub fn virtual_nodes_before(&self, level: u32) -> u32 {
        let v = shr_or_zero(self.virtual_leaves, self.levels - level + 1);
        2 * v - v.count_ones()
    }

    /// Converts an implicit index into the 0-based index of the node within
    /// the flat, level-contiguous node array.
    ///
    /// # Arguments
    /// * `implicit` - The implicit index of a real node.
    #[inline]
    pub fn memory_index(&self, implicit: u32) -> usize {
        let level = Self::level_of(implicit);
        debug_assert!(!self.is_virtual_at(level, implicit));

        (implicit - self.virtual_nodes_before(level)) as usize - 1
    }

    /// Returns whether the given implicit index addresses a virtual
    /// position.
    #[inline]
    pub fn is_virtual(&self, implicit: u32) -> bool {
        self.is_virtual_at(Self::level_of(implicit), implicit)
    }

    /// Virtual predicate for an index whose level is already known.
    #[inline]
    pub(crate) fn is_virtual_at(&self, level: u32, implicit: u32) -> bool {
        implicit - (1u32 << (level - 1)) >= self.num_real(level)
    }

    /// The total number of real nodes above the leaf level, i.e., the length
    /// of the flat node array.
    #[inline]
    pub fn num_internal_nodes(&self) -> usize {
        (1usize << (self.levels - 1)) - 1 - self.virtual_nodes_before(self.levels) as usize
    }

    /// The implicit index of the first position on the leaf level.
    #[inline]
    pub fn first_leaf(&self) -> u32 {
        1u32 << (self.levels - 1)
    }
}

#[inline]
fn shr_or_zero(value: u32, shift: u32) -> u32 {
    if shift >= u32::BITS {
        0
    } else {
        value >> shift
    }
}
