use glam::Vec3;
use rand::Rng;

use crate::config::{Config, ConfigError};
use crate::part::PartFactory;
use crate::publish::{self, InstancePublisher, LevelDraw};
use crate::scheduler;
use crate::store::LevelStore;
use crate::transform::Bounds;
use crate::types;
use crate::update::RootPose;

/// The owning aggregate for one fractal instance: the validated
/// configuration, every per-level array, and the per-level sequence
/// vectors.
///
/// Lifecycle: [`FractalTree::build`] allocates everything,
/// [`FractalTree::rebuild`] swaps in a new tree wholesale (the previous
/// tree stays active if the new configuration is rejected), and
/// [`FractalTree::teardown`] releases all arrays. There is no in-place
/// depth mutation.
#[derive(Debug)]
pub struct FractalTree {
    config: Config,
    store: LevelStore,
    sequences: Vec<[f32; 4]>,
    bounds: Bounds,
}

impl FractalTree {
    /// Validates the configuration and allocates the whole tree.
    pub fn build(config: Config, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        let factory = PartFactory::new(&config);
        let store = LevelStore::allocate(config.depth, &factory, rng);
        let sequences = publish::random_sequences(config.depth, rng);
        log::debug!(
            "built fractal tree: depth={}, nodes={}",
            config.depth,
            types::total_nodes(config.depth)
        );
        Ok(Self {
            config,
            store,
            sequences,
            bounds: Bounds::new(Vec3::ZERO, 0.0),
        })
    }

    /// Tears down and reallocates under a new configuration.
    ///
    /// Validation happens before anything is released, so on error the
    /// existing tree keeps serving frames unchanged.
    pub fn rebuild(&mut self, config: Config, rng: &mut impl Rng) -> Result<(), ConfigError> {
        let rebuilt = Self::build(config, rng)?;
        *self = rebuilt;
        Ok(())
    }

    /// Releases every per-level array. The tree no longer produces
    /// frames until the next [`FractalTree::rebuild`].
    pub fn teardown(&mut self) {
        self.store.release();
        self.sequences.clear();
        log::debug!("fractal tree released");
    }

    pub fn is_built(&self) -> bool {
        self.store.depth() > 0
    }

    pub fn depth(&self) -> usize {
        self.store.depth()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LevelStore {
        &self.store
    }

    /// Last frame's bounding volume.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Runs one frame: root synchronously, then the dependency-chained
    /// parallel level updates. Blocks until the final level completes.
    pub fn update(&mut self, delta_time: f32, pose: &RootPose) -> Bounds {
        self.bounds = scheduler::run_frame(delta_time, pose, self.config.mode, &mut self.store);
        self.bounds
    }

    /// Hands every level's finished matrices and draw metadata to the
    /// rendering collaborator. Call after [`FractalTree::update`].
    pub fn publish(&self, publisher: &mut impl InstancePublisher) {
        let depth = self.store.depth();
        publisher.begin_frame(self.bounds, depth);
        for level in 0..depth {
            let draw = LevelDraw {
                level,
                mesh: publish::mesh_for_level(level, depth),
                gradient_position: publish::gradient_position(level, depth),
                sequence: self.sequences[level],
            };
            publisher.submit_level(&draw, self.store.matrices(level));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::MeshKind;
    use crate::transform::PackedTransform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(depth: usize) -> FractalTree {
        let mut cfg = Config::default();
        cfg.depth = depth;
        FractalTree::build(cfg, &mut StdRng::seed_from_u64(31)).unwrap()
    }

    /// Records everything crossing the boundary, one entry per level.
    #[derive(Default)]
    struct RecordingPublisher {
        bounds: Option<Bounds>,
        depth: usize,
        levels: Vec<(LevelDraw, usize)>,
    }

    impl InstancePublisher for RecordingPublisher {
        fn begin_frame(&mut self, bounds: Bounds, depth: usize) {
            self.bounds = Some(bounds);
            self.depth = depth;
            self.levels.clear();
        }

        fn submit_level(&mut self, draw: &LevelDraw, matrices: &[PackedTransform]) {
            self.levels.push((*draw, matrices.len()));
        }
    }

    #[test]
    fn build_allocates_levels_and_sequences() {
        let tree = build(4);
        assert!(tree.is_built());
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.store().level_len(3), 125);
        assert_eq!(tree.config().depth, 4);
    }

    #[test]
    fn build_rejects_invalid_configuration() {
        let mut cfg = Config::default();
        cfg.depth = 0;
        let result = FractalTree::build(cfg, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(ConfigError::DepthOutOfRange(0))));
    }

    #[test]
    fn failed_rebuild_keeps_the_previous_tree_active() {
        let mut tree = build(3);
        let mut bad = Config::default();
        bad.depth = 42;

        let result = tree.rebuild(bad, &mut StdRng::seed_from_u64(1));
        assert!(result.is_err());
        assert_eq!(tree.depth(), 3);

        // The surviving tree still updates normally.
        let bounds = tree.update(0.016, &RootPose::default());
        assert_eq!(bounds.center, Vec3::ZERO);
    }

    #[test]
    fn rebuild_with_new_depth_reallocates_everything() {
        let mut tree = build(3);
        let mut cfg = *tree.config();
        cfg.depth = 5;
        tree.rebuild(cfg, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(tree.depth(), 5);
        assert_eq!(tree.store().level_len(4), 625);
    }

    #[test]
    fn teardown_releases_all_arrays() {
        let mut tree = build(3);
        tree.teardown();
        assert!(!tree.is_built());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn publish_hands_over_every_level_once() {
        let mut tree = build(4);
        let bounds = tree.update(0.016, &RootPose::default());

        let mut publisher = RecordingPublisher::default();
        tree.publish(&mut publisher);

        assert_eq!(publisher.bounds, Some(bounds));
        assert_eq!(publisher.depth, 4);
        assert_eq!(publisher.levels.len(), 4);

        for (level, (draw, count)) in publisher.levels.iter().enumerate() {
            assert_eq!(draw.level, level);
            assert_eq!(*count, types::level_len(level));
            assert!((0.0..=1.0).contains(&draw.gradient_position));
            let expected = if level == 3 {
                MeshKind::Leaf
            } else {
                MeshKind::Branch
            };
            assert_eq!(draw.mesh, expected);
        }
    }

    #[test]
    fn update_moves_the_bounds_with_the_root() {
        let mut tree = build(2);
        let pose = RootPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..RootPose::default()
        };
        let bounds = tree.update(0.016, &pose);
        assert_eq!(bounds.center, pose.position);
        assert_eq!(tree.bounds(), bounds);
    }
}
