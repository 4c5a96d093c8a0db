//! TRS transforms for entities that have one.

use nalgebra::{Matrix4, Rotation3, Vector3};

/// Position / euler rotation / scale of an entity, in local space.
///
/// Rotation is stored in radians; wrapped data stores degrees (the map
/// formats do), conversion happens when the transform is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles, radians, applied in roll/pitch/yaw order.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Local matrix: translation * rotation * scale.
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::new_translation(&self.position);
        let r = Rotation3::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z)
            .to_homogeneous();
        let s = Matrix4::new_nonuniform_scaling(&self.scale);
        t * r * s
    }
}

pub(crate) fn deg_to_rad(deg: f32) -> f32 {
    deg * (std::f32::consts::PI / 180.0)
}

pub(crate) fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / std::f32::consts::PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert_eq!(m, Matrix4::identity());
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            ..Transform::default()
        };
        let m = t.matrix();
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn degree_round_trip() {
        let r = deg_to_rad(90.0);
        assert!((rad_to_deg(r) - 90.0).abs() < 1e-4);
    }
}
