use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

use crate::core::math::{quat_nearly_equal, vec3_nearly_equal};
use crate::scene::NodeHandle;

/// Rotation of a spatial node, in one of three interchangeable forms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    /// Pitch (x), yaw (y) and roll (z) in radians, applied yaw → pitch → roll.
    Euler(Vec3),
    Quaternion(Quat),
    /// Orient the node's forward axis (-Z) along `forward`.
    Direction { forward: Vec3, up: Vec3 },
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Euler(Vec3::ZERO)
    }
}

impl Rotation {
    #[must_use]
    pub fn to_quat(&self) -> Quat {
        match *self {
            Rotation::Euler(e) => Quat::from_euler(EulerRot::YXZ, e.y, e.x, e.z),
            Rotation::Quaternion(q) => q.normalize(),
            Rotation::Direction { forward, up } => direction_to_quat(forward, up),
        }
    }

    /// Tolerance comparison within the same form; different forms compare
    /// by their resulting orientation.
    #[must_use]
    pub fn nearly_equals(&self, other: &Rotation) -> bool {
        match (self, other) {
            (Rotation::Euler(a), Rotation::Euler(b)) => vec3_nearly_equal(*a, *b),
            (
                Rotation::Direction { forward: fa, up: ua },
                Rotation::Direction { forward: fb, up: ub },
            ) => vec3_nearly_equal(*fa, *fb) && vec3_nearly_equal(*ua, *ub),
            _ => quat_nearly_equal(self.to_quat(), other.to_quat()),
        }
    }
}

/// Same basis construction as a look-at, without the translation.
fn direction_to_quat(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or_zero();
    if f == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = f.cross(up);
    if right.length_squared() < 1e-8 {
        // `up` parallel to `forward`: any perpendicular axis will do.
        right = f.cross(if f.y.abs() < 0.99 { Vec3::Y } else { Vec3::X });
    }
    let right = right.normalize();
    let up = right.cross(f);
    Quat::from_mat3(&Mat3::from_cols(right, up, -f))
}

/// How a spatial node builds its local matrix.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum TransformMode {
    /// `T * R * S`.
    #[default]
    ScaleRotationTranslation,
    /// `T * R`; scaling is ignored.
    RotationTranslation,
    /// `T`; rotation and scaling are ignored.
    Translation,
    /// A caller-supplied matrix used as the local matrix.
    Custom(Mat4),
    /// Use another node's world matrix as the local matrix.
    ///
    /// The source is read when this node is visited. A source that comes
    /// later in traversal order still holds its previous-frame world matrix,
    /// so the copy lags one frame behind it.
    TakeFromOther(NodeHandle),
    /// Always identity.
    Identity,
}

impl TransformMode {
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<NodeHandle> {
        match self {
            TransformMode::TakeFromOther(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// Builds the local matrix for every mode except [`TransformMode::TakeFromOther`],
/// whose local matrix is only known during traversal.
#[must_use]
pub fn compose_local(mode: &TransformMode, position: Vec3, rotation: &Rotation, scaling: Vec3) -> Option<Mat4> {
    match mode {
        TransformMode::ScaleRotationTranslation => Some(Mat4::from_scale_rotation_translation(
            scaling,
            rotation.to_quat(),
            position,
        )),
        TransformMode::RotationTranslation => Some(Mat4::from_rotation_translation(rotation.to_quat(), position)),
        TransformMode::Translation => Some(Mat4::from_translation(position)),
        TransformMode::Custom(matrix) => Some(*matrix),
        TransformMode::TakeFromOther(_) => None,
        TransformMode::Identity => Some(Mat4::IDENTITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::{mat4_nearly_equal, vec3_nearly_equal};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn euler_yaw_turns_forward_to_left() {
        let q = Rotation::Euler(Vec3::new(0.0, FRAC_PI_2, 0.0)).to_quat();
        assert!(vec3_nearly_equal(q * Vec3::NEG_Z, Vec3::NEG_X));
    }

    #[test]
    fn direction_rotation_points_forward_axis() {
        let dir = Vec3::new(1.0, 0.0, 0.0);
        let q = Rotation::Direction { forward: dir, up: Vec3::Y }.to_quat();
        assert!(vec3_nearly_equal(q * Vec3::NEG_Z, dir));
    }

    #[test]
    fn degenerate_direction_is_identity() {
        let q = Rotation::Direction { forward: Vec3::ZERO, up: Vec3::Y }.to_quat();
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn different_forms_compare_by_orientation() {
        let euler = Rotation::Euler(Vec3::new(0.0, FRAC_PI_2, 0.0));
        let quat = Rotation::Quaternion(Quat::from_rotation_y(FRAC_PI_2));
        assert!(euler.nearly_equals(&quat));
    }

    #[test]
    fn translation_mode_ignores_rotation_and_scale() {
        let m = compose_local(
            &TransformMode::Translation,
            Vec3::new(1.0, 2.0, 3.0),
            &Rotation::Euler(Vec3::splat(0.7)),
            Vec3::splat(4.0),
        )
        .unwrap();
        assert!(mat4_nearly_equal(&m, &Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))));
    }
}
