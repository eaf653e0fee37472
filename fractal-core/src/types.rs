/// Index of a generation in the fractal tree.
///
/// Level 0 is the root; level `L` holds `5^L` nodes. A `Level` is only
/// meaningful within the lifetime of a given
/// [`crate::store::LevelStore`] allocation.
pub type Level = usize;

/// Number of children spawned per node. Fixed by the five discrete
/// child-slot orientations; other factors are unsupported.
pub const BRANCH_FACTOR: usize = 5;

/// Smallest supported tree depth (root only).
pub const MIN_DEPTH: usize = 1;

/// Largest supported tree depth (5^8 leaf nodes).
pub const MAX_DEPTH: usize = 9;

/// Node count of a single level.
#[inline]
pub fn level_len(level: Level) -> usize {
    BRANCH_FACTOR.pow(level as u32)
}

/// Total node count of a tree with the given depth: `(5^depth - 1) / 4`.
#[inline]
pub fn total_nodes(depth: usize) -> usize {
    (BRANCH_FACTOR.pow(depth as u32) - 1) / (BRANCH_FACTOR - 1)
}

/// Index of a node's parent in the previous level.
#[inline]
pub fn parent_of(index: usize) -> usize {
    index / BRANCH_FACTOR
}

/// Child slot (0..4) selecting a node's fixed orientation offset.
#[inline]
pub fn child_slot(index: usize) -> usize {
    index % BRANCH_FACTOR
}
