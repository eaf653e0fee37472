//! Per-frame world-transform math for the fractal tree.
//!
//! The typical frame looks like:
//! 1. [`update_root`] — advance the root from the owning object's pose.
//! 2. [`update_level`] for levels `1..depth` — recompute each node's
//!    world rotation and position from its parent and pack the output
//!    matrix, halving the scale per level.
//!
//! The level update is written so that it is safe to run in parallel
//! across disjoint index ranges of one level: each index reads only
//! `parents[i / 5]` (finalized by the previous level's update) and
//! writes only its own slots in `parts` and `matrices`.

use glam::{Quat, Vec3};

use crate::config::UpdateMode;
use crate::part::PartState;
use crate::transform::PackedTransform;
use crate::types::parent_of;

/// Distance from a parent to its children, in multiples of the child
/// level's scale.
pub const BRANCH_OFFSET: f32 = 1.5;

/// The owning object's transform, read once per frame as the root's
/// external driving input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for RootPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

/// Advances the root node and writes its output matrix.
///
/// The root composes its spin on top of the owning object's rotation
/// and sits at the owning object's position; its matrix uses the
/// object's uniform scale.
pub fn update_root(
    delta_time: f32,
    pose: &RootPose,
    part: &mut PartState,
    matrix: &mut PackedTransform,
) {
    part.spin_angle += part.spin_velocity * delta_time;
    part.world_rotation =
        pose.rotation * (part.base_rotation * Quat::from_rotation_y(part.spin_angle));
    part.world_position = pose.position;
    *matrix = PackedTransform::from_trs(part.world_rotation, part.world_position, pose.scale);
}

/// Recomputes one whole level from its parent level.
///
/// For every index `i`: advance the spin accumulator, derive the world
/// rotation from `parents[i / 5]` under the given mode, derive the
/// world position, and pack rotation-times-`scale` plus position into
/// `matrices[i]`.
///
/// The two modes compose rotations in different orders on purpose —
/// `Rigid` applies everything in parent space, `Sagging` injects the
/// droop rotation in world space before the parent's rotation — and
/// that order must not be unified, since it decides the droop
/// direction.
///
/// ### Parameters
/// - `delta_time` - Elapsed seconds since the previous frame.
/// - `scale` - This level's absolute scale (`object scale * 0.5^L`).
/// - `mode` - Rotation policy; see [`UpdateMode`].
/// - `parents` - Previous level, fully written by the previous task.
/// - `parts`, `matrices` - This level, rewritten in place.
///
/// ### Panics
/// Panics if a parent index falls outside `parents` — that is a broken
/// allocation contract, not a recoverable condition.
pub fn update_level(
    delta_time: f32,
    scale: f32,
    mode: UpdateMode,
    parents: &[PartState],
    parts: &mut [PartState],
    matrices: &mut [PackedTransform],
) {
    update_level_slice(delta_time, scale, mode, parents, 0, parts, matrices);
}

/// [`update_level`] over a sub-range starting at global index `base`.
/// This is the unit the scheduler hands to worker threads; slices from
/// the same level must not overlap.
pub(crate) fn update_level_slice(
    delta_time: f32,
    scale: f32,
    mode: UpdateMode,
    parents: &[PartState],
    base: usize,
    parts: &mut [PartState],
    matrices: &mut [PackedTransform],
) {
    debug_assert_eq!(parts.len(), matrices.len());

    for (offset, (part, matrix)) in parts.iter_mut().zip(matrices.iter_mut()).enumerate() {
        let parent = &parents[parent_of(base + offset)];
        part.spin_angle += part.spin_velocity * delta_time;
        let spin = Quat::from_rotation_y(part.spin_angle);

        match mode {
            UpdateMode::Rigid => {
                part.world_rotation = parent.world_rotation * (part.base_rotation * spin);
                part.world_position = parent.world_position
                    + parent.world_rotation * (BRANCH_OFFSET * scale * part.direction);
            }
            UpdateMode::Sagging => {
                let up_axis = (parent.world_rotation * part.base_rotation) * Vec3::Y;
                let sag_axis = Vec3::Y.cross(up_axis);
                let sag_magnitude = sag_axis.length();
                let anchor = if sag_magnitude > 0.0 {
                    let sag_rotation = Quat::from_axis_angle(
                        sag_axis / sag_magnitude,
                        part.max_sag_angle * sag_magnitude,
                    );
                    sag_rotation * parent.world_rotation
                } else {
                    // Branch still points straight up; nothing to sag.
                    parent.world_rotation
                };
                part.world_rotation = anchor * (part.base_rotation * spin);
                part.world_position = parent.world_position
                    + part.world_rotation * Vec3::new(0.0, BRANCH_OFFSET * scale, 0.0);
            }
        }

        *matrix = PackedTransform::from_trs(part.world_rotation, part.world_position, scale);
    }
}
