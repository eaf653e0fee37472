use rand::Rng;

use crate::transform::{Bounds, PackedTransform};
use crate::types::Level;

/// Which external mesh asset a level is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
    Branch,
    Leaf,
}

/// Per-level rendering metadata handed across the boundary together
/// with the finished matrix array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelDraw {
    pub level: Level,
    pub mesh: MeshKind,
    /// Color gradient position, `level / (depth - 2)` clamped to [0, 1].
    pub gradient_position: f32,
    /// Per-level pseudo-random vector fixed at construction; consumed
    /// by the shader for visual variance, never by the update math.
    pub sequence: [f32; 4],
}

/// Boundary toward the rendering collaborator.
///
/// The kernel calls [`InstancePublisher::begin_frame`] once per frame
/// after the scheduler's final level has completed, then
/// [`InstancePublisher::submit_level`] once per level with the full
/// matrix array — never a partially-updated one. Implementations own
/// their upload scratch state and may initialize it lazily on first
/// use.
pub trait InstancePublisher {
    fn begin_frame(&mut self, bounds: Bounds, depth: usize);
    fn submit_level(&mut self, draw: &LevelDraw, matrices: &[PackedTransform]);
}

/// The final level is drawn with the leaf mesh; everything else with
/// the branch mesh. A depth-1 tree is a single leaf.
pub fn mesh_for_level(level: Level, depth: usize) -> MeshKind {
    if level + 1 == depth {
        MeshKind::Leaf
    } else {
        MeshKind::Branch
    }
}

/// Gradient sampling position for a level. Defined as 0 for trees too
/// shallow to span the gradient.
pub fn gradient_position(level: Level, depth: usize) -> f32 {
    if depth <= 2 {
        0.0
    } else {
        (level as f32 / (depth - 2) as f32).min(1.0)
    }
}

/// One fixed pseudo-random 4-vector per level, drawn at construction.
pub fn random_sequences(depth: usize, rng: &mut impl Rng) -> Vec<[f32; 4]> {
    (0..depth)
        .map(|_| std::array::from_fn(|_| rng.random::<f32>()))
        .collect()
}
