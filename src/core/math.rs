//! Numeric helpers shared by the transform pipeline.
//!
//! All change detection on floating point values goes through these helpers
//! so that values reported identically every tick (within rounding) do not
//! trigger recomputation.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Tolerance used for every float equality test in the core.
pub const EQUALITY_TOLERANCE: f32 = 1e-5;

/// RGBA color, linear space.
pub type Color = Vec4;

pub const WHITE: Color = Vec4::ONE;

#[inline]
#[must_use]
pub fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= EQUALITY_TOLERANCE
}

#[inline]
#[must_use]
pub fn vec3_nearly_equal(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EQUALITY_TOLERANCE)
}

#[inline]
#[must_use]
pub fn vec4_nearly_equal(a: Vec4, b: Vec4) -> bool {
    a.abs_diff_eq(b, EQUALITY_TOLERANCE)
}

/// Quaternions `q` and `-q` describe the same rotation.
#[inline]
#[must_use]
pub fn quat_nearly_equal(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, EQUALITY_TOLERANCE) || a.abs_diff_eq(-b, EQUALITY_TOLERANCE)
}

#[inline]
#[must_use]
pub fn mat4_nearly_equal(a: &Mat4, b: &Mat4) -> bool {
    a.abs_diff_eq(*b, EQUALITY_TOLERANCE)
}
