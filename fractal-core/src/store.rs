use rand::Rng;

use crate::part::{PartFactory, PartState};
use crate::transform::PackedTransform;
use crate::types::{self, BRANCH_FACTOR, Level};

/// Owns one contiguous `PartState` array and one contiguous output
/// matrix array per level, sized `5^L`.
///
/// The whole array set is allocated in one [`LevelStore::allocate`]
/// call and torn down in one [`LevelStore::release`] call; lengths
/// never change in between. Nodes are never added or removed
/// individually — a depth change means release + reallocate.
///
/// Shape invariants, checked once at allocation:
/// - Level 0 holds exactly one node.
/// - Level `L` holds exactly five times as many nodes as level `L-1`.
/// - Each level's matrix array matches its part array in length.
#[derive(Clone, Debug, Default)]
pub struct LevelStore {
    parts: Vec<Vec<PartState>>,
    matrices: Vec<Vec<PackedTransform>>,
}

impl LevelStore {
    /// A released store with no levels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Allocates every level for the given depth and runs the factory
    /// once per node.
    ///
    /// Node `i` of a level gets the child slot `i mod 5`; the root gets
    /// slot 0. The caller validates `depth` beforehand.
    ///
    /// ### Parameters
    /// - `depth` - Number of levels, including the root.
    /// - `factory` - Produces the static per-node state.
    /// - `rng` - Entropy source for the randomized part parameters.
    pub fn allocate(depth: usize, factory: &PartFactory, rng: &mut impl Rng) -> Self {
        let mut parts = Vec::with_capacity(depth);
        let mut matrices = Vec::with_capacity(depth);

        for level in 0..depth {
            let len = types::level_len(level);
            let level_parts: Vec<PartState> = (0..len)
                .map(|i| factory.create_part(types::child_slot(i), rng))
                .collect();
            parts.push(level_parts);
            matrices.push(vec![PackedTransform::ZERO; len]);
        }

        let store = Self { parts, matrices };
        store.assert_shape();
        store
    }

    /// Drops every per-level array. The store is unusable until the
    /// next [`LevelStore::allocate`].
    pub fn release(&mut self) {
        self.parts.clear();
        self.matrices.clear();
    }

    /// Number of levels; zero for a released store.
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    pub fn level_len(&self, level: Level) -> usize {
        self.parts[level].len()
    }

    pub fn parts(&self, level: Level) -> &[PartState] {
        &self.parts[level]
    }

    pub fn matrices(&self, level: Level) -> &[PackedTransform] {
        &self.matrices[level]
    }

    /// Mutable access to the single root node and its output matrix.
    pub fn root_mut(&mut self) -> (&mut PartState, &mut PackedTransform) {
        (&mut self.parts[0][0], &mut self.matrices[0][0])
    }

    /// Splits the store for one level update: the previous level's
    /// parts read-only, this level's parts and matrices read-write.
    ///
    /// This is the borrow shape the per-frame tasks rely on: a level's
    /// writers never alias the parent level they read.
    ///
    /// ### Panics
    /// Panics if `level` is 0 or out of range.
    pub fn split_level_mut(
        &mut self,
        level: Level,
    ) -> (&[PartState], &mut [PartState], &mut [PackedTransform]) {
        assert!(
            level >= 1 && level < self.parts.len(),
            "level {level} has no parent level"
        );
        let (parents, rest) = self.parts.split_at_mut(level);
        (&parents[level - 1], &mut rest[0], &mut self.matrices[level])
    }

    fn assert_shape(&self) {
        if let Some(root) = self.parts.first() {
            assert_eq!(root.len(), 1, "level 0 must hold exactly the root");
        }
        for level in 1..self.parts.len() {
            assert_eq!(
                self.parts[level].len(),
                BRANCH_FACTOR * self.parts[level - 1].len(),
                "level {level} node count must be 5x its parent level"
            );
            assert_eq!(self.parts[level].len(), self.matrices[level].len());
        }
    }
}
