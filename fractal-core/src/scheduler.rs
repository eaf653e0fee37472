//! Per-frame scheduling of the level updates.
//!
//! The frame protocol is a chain of dependent parallel jobs, never one
//! flat parallel-for over the whole tree:
//! 1. The root is updated synchronously (one node, no parallelism win).
//! 2. Each level `1..depth` is dispatched as a rayon parallel-for over
//!    batches of its nodes. The call joins before returning, which is
//!    the barrier that keeps level `L+1` from reading level `L` while
//!    it is still being written.
//! 3. The final join is the frame's single blocking point; after it the
//!    matrices are complete and may be handed to the publisher.

use rayon::prelude::*;

use crate::config::UpdateMode;
use crate::store::LevelStore;
use crate::transform::Bounds;
use crate::types::BRANCH_FACTOR;
use crate::update::{self, RootPose};

/// Nodes per parallel batch. A multiple of the branching factor, so a
/// batch always covers whole child sets and batch boundaries land on
/// parent boundaries.
pub const LEVEL_BATCH: usize = BRANCH_FACTOR * 64;

/// Runs one frame over the whole store and returns the enclosing
/// bounding volume for the draw-submission boundary.
///
/// Scale halves per level starting from the owning object's scale. The
/// bounds are centered on the root's world position with a half-extent
/// proportional to the object scale.
///
/// ### Panics
/// Panics on a released (zero-depth) store.
pub fn run_frame(
    delta_time: f32,
    pose: &RootPose,
    mode: UpdateMode,
    store: &mut LevelStore,
) -> Bounds {
    assert!(store.depth() > 0, "cannot update a released level store");

    let (root, root_matrix) = store.root_mut();
    update::update_root(delta_time, pose, root, root_matrix);
    let root_position = root.world_position;

    let mut scale = pose.scale;
    for level in 1..store.depth() {
        scale *= 0.5;
        let (parents, parts, matrices) = store.split_level_mut(level);
        parts
            .par_chunks_mut(LEVEL_BATCH)
            .zip(matrices.par_chunks_mut(LEVEL_BATCH))
            .enumerate()
            .for_each(|(chunk, (parts, matrices))| {
                update::update_level_slice(
                    delta_time,
                    scale,
                    mode,
                    parents,
                    chunk * LEVEL_BATCH,
                    parts,
                    matrices,
                );
            });
        // The parallel-for has joined: this level is fully written
        // before the next one is dispatched.
    }

    Bounds::new(root_position, 1.5 * pose.scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::part::PartFactory;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_store(depth: usize, seed: u64) -> LevelStore {
        let factory = PartFactory::new(&Config::default());
        let mut rng = StdRng::seed_from_u64(seed);
        LevelStore::allocate(depth, &factory, &mut rng)
    }

    #[test]
    fn batch_length_respects_child_set_boundaries() {
        assert_eq!(LEVEL_BATCH % BRANCH_FACTOR, 0);
    }

    #[test]
    fn parallel_frame_matches_sequential_reference() {
        for mode in [UpdateMode::Rigid, UpdateMode::Sagging] {
            let mut parallel = build_store(5, 11);
            let mut sequential = parallel.clone();
            let pose = RootPose::default();

            for _ in 0..3 {
                run_frame(0.016, &pose, mode, &mut parallel);

                // Reference: same protocol, single-threaded level loop.
                let (root, root_matrix) = sequential.root_mut();
                update::update_root(0.016, &pose, root, root_matrix);
                let mut scale = pose.scale;
                for level in 1..sequential.depth() {
                    scale *= 0.5;
                    let (parents, parts, matrices) = sequential.split_level_mut(level);
                    update::update_level(0.016, scale, mode, parents, parts, matrices);
                }
            }

            for level in 0..parallel.depth() {
                assert_eq!(
                    parallel.matrices(level),
                    sequential.matrices(level),
                    "mode {mode:?}, level {level}"
                );
            }
        }
    }

    #[test]
    fn scale_halves_at_every_level() {
        let mut store = build_store(4, 12);
        let pose = RootPose::default();
        run_frame(0.016, &pose, UpdateMode::Sagging, &mut store);

        for level in 0..store.depth() {
            let expected = 0.5f32.powi(level as i32);
            for matrix in store.matrices(level) {
                assert!(
                    (matrix.uniform_scale() - expected).abs() < 1e-5,
                    "level {level}"
                );
            }
        }
    }

    #[test]
    fn bounds_track_the_root() {
        let mut store = build_store(3, 13);
        let pose = RootPose {
            position: Vec3::new(4.0, 5.0, -6.0),
            scale: 2.0,
            ..RootPose::default()
        };
        let bounds = run_frame(0.016, &pose, UpdateMode::Rigid, &mut store);

        assert_eq!(bounds.center, pose.position);
        assert!((bounds.half_extent - 3.0).abs() < 1e-6);
    }

    #[test]
    fn root_only_tree_skips_the_level_loop() {
        let mut store = build_store(1, 14);
        let bounds = run_frame(0.016, &RootPose::default(), UpdateMode::Sagging, &mut store);
        assert_eq!(bounds.center, Vec3::ZERO);
        assert!(store.matrices(0)[0].uniform_scale() > 0.0);
    }

    #[test]
    fn levels_wider_than_one_batch_still_update_every_node() {
        // Depth 5 puts 625 nodes in the last level, i.e. two batches.
        let mut store = build_store(5, 15);
        run_frame(0.016, &RootPose::default(), UpdateMode::Rigid, &mut store);

        for matrix in store.matrices(4) {
            assert!(matrix.uniform_scale() > 0.0, "node left stale");
        }
    }
}
