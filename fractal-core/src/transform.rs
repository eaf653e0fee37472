use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Quat, Vec3};

/// Packed per-instance payload: a column-major 3x4 affine transform.
///
/// The first three columns are the rotation matrix scaled uniformly,
/// the fourth is the translation. `#[repr(C)]` with no padding, so a
/// whole level's array can be uploaded as one byte slice.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedTransform {
    pub cols: [[f32; 3]; 4],
}

impl PackedTransform {
    pub const ZERO: Self = Self { cols: [[0.0; 3]; 4] };

    /// Packs a rotation scaled by `scale`, plus a translation.
    pub fn from_trs(rotation: Quat, translation: Vec3, scale: f32) -> Self {
        let m = Mat3::from_quat(rotation) * scale;
        Self {
            cols: [
                m.x_axis.to_array(),
                m.y_axis.to_array(),
                m.z_axis.to_array(),
                translation.to_array(),
            ],
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from_array(self.cols[3])
    }

    pub fn rotation_scale(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::from_array(self.cols[0]),
            Vec3::from_array(self.cols[1]),
            Vec3::from_array(self.cols[2]),
        )
    }

    /// Uniform scale encoded in the rotation block.
    pub fn uniform_scale(&self) -> f32 {
        Vec3::from_array(self.cols[0]).length()
    }
}

/// Axis-aligned bounding volume handed to the draw-submission boundary
/// as culling input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub half_extent: f32,
}

impl Bounds {
    pub const fn new(center: Vec3, half_extent: f32) -> Self {
        Self {
            center,
            half_extent,
        }
    }
}
