//! Hosted objects: external sources that drive a spatial node's transform.
//!
//! While a node hosts an object, the update pass pulls position, rotation,
//! scaling, opacity and color from it each frame instead of from the node's
//! own setters. Which components are taken is controlled by [`HostMode`].

use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use crate::core::math::{Color, WHITE};

/// An external provider of transform and display values.
pub trait TransformSource: Send + Sync {
    fn position(&self) -> Vec3;

    /// Euler angles in radians (pitch, yaw, roll).
    fn rotation(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn scaling(&self) -> Vec3 {
        Vec3::ONE
    }

    fn opacity(&self) -> f32 {
        1.0
    }

    fn color(&self) -> Color {
        WHITE
    }
}

/// Which components of a hosted object are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HostMode {
    #[default]
    Full,
    IgnoreRotation,
    IgnoreScaling,
    IgnoreRotationAndScaling,
}

impl HostMode {
    #[inline]
    #[must_use]
    pub fn takes_rotation(self) -> bool {
        matches!(self, HostMode::Full | HostMode::IgnoreScaling)
    }

    #[inline]
    #[must_use]
    pub fn takes_scaling(self) -> bool {
        matches!(self, HostMode::Full | HostMode::IgnoreRotation)
    }
}

/// Values sampled from a hosted object for one frame, with the mode applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HostedValues {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scaling: Vec3,
    pub opacity: f32,
    pub color: Color,
}

#[derive(Clone)]
pub(crate) struct HostedObject {
    source: Arc<dyn TransformSource>,
    mode: HostMode,
}

impl HostedObject {
    pub(crate) fn new(source: Arc<dyn TransformSource>, mode: HostMode) -> Self {
        Self { source, mode }
    }

    pub(crate) fn mode(&self) -> HostMode {
        self.mode
    }

    pub(crate) fn sample(&self) -> HostedValues {
        HostedValues {
            position: self.source.position(),
            rotation: if self.mode.takes_rotation() {
                self.source.rotation()
            } else {
                Vec3::ZERO
            },
            scaling: if self.mode.takes_scaling() {
                self.source.scaling()
            } else {
                Vec3::ONE
            },
            opacity: self.source.opacity(),
            color: self.source.color(),
        }
    }
}

impl fmt::Debug for HostedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedObject").field("mode", &self.mode).finish_non_exhaustive()
    }
}
