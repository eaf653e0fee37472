use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use rand::Rng;

use crate::config::{Config, ParamRange};
use crate::types::BRANCH_FACTOR;

/// Per-node state.
///
/// `direction` and `base_rotation` are fixed at construction from the
/// child slot; `world_rotation`, `world_position` and `spin_angle` are
/// rewritten every frame; `spin_velocity` and `max_sag_angle` are
/// randomized once and immutable afterwards.
#[derive(Clone, Copy, Debug)]
pub struct PartState {
    pub direction: Vec3,
    pub base_rotation: Quat,
    pub world_rotation: Quat,
    pub world_position: Vec3,
    pub spin_angle: f32,
    pub spin_velocity: f32,
    pub max_sag_angle: f32,
}

/// Fixed growth direction per child slot: up, right, left, forward, back.
pub const CHILD_DIRECTIONS: [Vec3; BRANCH_FACTOR] =
    [Vec3::Y, Vec3::X, Vec3::NEG_X, Vec3::NEG_Z, Vec3::Z];

/// Fixed orientation offset per child slot. Each rotation maps local up
/// onto the matching entry of [`CHILD_DIRECTIONS`].
pub fn child_base_rotation(slot: usize) -> Quat {
    match slot {
        0 => Quat::IDENTITY,
        1 => Quat::from_rotation_z(-FRAC_PI_2),
        2 => Quat::from_rotation_z(FRAC_PI_2),
        3 => Quat::from_rotation_x(-FRAC_PI_2),
        4 => Quat::from_rotation_x(FRAC_PI_2),
        _ => panic!("child slot {slot} out of range"),
    }
}

/// Produces the static per-node state for a child slot, consuming
/// entropy for the randomized spin and sag parameters.
#[derive(Clone, Copy, Debug)]
pub struct PartFactory {
    spin_velocity: ParamRange,
    reverse_spin_chance: f64,
    max_sag_angle: ParamRange,
}

impl PartFactory {
    pub fn new(cfg: &Config) -> Self {
        Self {
            spin_velocity: cfg.spin_velocity,
            reverse_spin_chance: cfg.reverse_spin_chance,
            max_sag_angle: cfg.max_sag_angle,
        }
    }

    /// Builds one part for the given child slot (0..4).
    pub fn create_part(&self, slot: usize, rng: &mut impl Rng) -> PartState {
        let mut spin_velocity = self.spin_velocity.sample(rng);
        if rng.random_bool(self.reverse_spin_chance) {
            spin_velocity = -spin_velocity;
        }

        PartState {
            direction: CHILD_DIRECTIONS[slot],
            base_rotation: child_base_rotation(slot),
            world_rotation: Quat::IDENTITY,
            world_position: Vec3::ZERO,
            spin_angle: 0.0,
            spin_velocity,
            max_sag_angle: self.max_sag_angle.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn base_rotation_maps_up_onto_slot_direction() {
        for slot in 0..BRANCH_FACTOR {
            let rotated = child_base_rotation(slot) * Vec3::Y;
            let expected = CHILD_DIRECTIONS[slot];
            assert!(
                (rotated - expected).length() < 1e-6,
                "slot {slot}: {rotated} != {expected}"
            );
        }
    }

    #[test]
    #[should_panic]
    fn slot_out_of_range_panics() {
        child_base_rotation(BRANCH_FACTOR);
    }

    #[test]
    fn created_part_starts_at_rest() {
        let factory = PartFactory::new(&Config::default());
        let mut rng = StdRng::seed_from_u64(1);
        let part = factory.create_part(2, &mut rng);

        assert_eq!(part.direction, Vec3::NEG_X);
        assert_eq!(part.world_rotation, Quat::IDENTITY);
        assert_eq!(part.world_position, Vec3::ZERO);
        assert_eq!(part.spin_angle, 0.0);
    }

    #[test]
    fn randomized_parameters_respect_configured_ranges() {
        let mut cfg = Config::default();
        cfg.spin_velocity = ParamRange::new(0.2, 0.4);
        cfg.max_sag_angle = ParamRange::new(0.1, 0.3);
        cfg.reverse_spin_chance = 0.0;

        let factory = PartFactory::new(&cfg);
        let mut rng = StdRng::seed_from_u64(2);
        for slot in [0, 1, 2, 3, 4, 0, 3] {
            let part = factory.create_part(slot, &mut rng);
            assert!((0.2..=0.4).contains(&part.spin_velocity));
            assert!((0.1..=0.3).contains(&part.max_sag_angle));
        }
    }

    #[test]
    fn certain_reverse_chance_flips_every_spin() {
        let mut cfg = Config::default();
        cfg.spin_velocity = ParamRange::new(0.2, 0.4);
        cfg.reverse_spin_chance = 1.0;

        let factory = PartFactory::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let part = factory.create_part(0, &mut rng);
            assert!((-0.4..=-0.2).contains(&part.spin_velocity));
        }
    }

    #[test]
    fn pinned_seed_reproduces_the_same_parts() {
        let factory = PartFactory::new(&Config::default());
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);

        for slot in 0..BRANCH_FACTOR {
            let pa = factory.create_part(slot, &mut a);
            let pb = factory.create_part(slot, &mut b);
            assert_eq!(pa.spin_velocity, pb.spin_velocity);
            assert_eq!(pa.max_sag_angle, pb.max_sag_angle);
        }
    }
}
