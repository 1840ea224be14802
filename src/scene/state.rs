//! Per-frame traversal state.

use glam::Mat4;

use crate::core::device::{DeviceRegistry, RenderDevice};

/// Frame timing handed to animation drivers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateTime {
    /// Seconds since the previous update.
    pub delta: f32,
    /// Seconds since the engine started updating.
    pub total: f32,
    pub frame: u64,
}

impl UpdateTime {
    #[must_use]
    pub fn new(delta: f32, total: f32, frame: u64) -> Self {
        Self { delta, total, frame }
    }

    /// Time for the frame after this one.
    #[must_use]
    pub fn advance(self, delta: f32) -> Self {
        Self {
            delta,
            total: self.total + delta,
            frame: self.frame + 1,
        }
    }
}

/// Stack of accumulated world matrices.
///
/// Each entry is already absolute, so [`top`](Self::top) is the parent
/// world matrix of whatever is being visited. An empty stack reads as
/// identity.
#[derive(Debug, Clone, Default)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
}

impl MatrixStack {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, world: Mat4) {
        self.stack.push(world);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Mat4> {
        self.stack.pop()
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Mutable state threaded through one update traversal of one scene.
pub struct UpdateState<'a> {
    devices: &'a DeviceRegistry,
    time: UpdateTime,
    pub(crate) matrices: MatrixStack,
    force_transform_update: bool,
}

impl<'a> UpdateState<'a> {
    #[must_use]
    pub fn new(devices: &'a DeviceRegistry, time: UpdateTime) -> Self {
        Self::with_stack_capacity(devices, time, 32)
    }

    #[must_use]
    pub fn with_stack_capacity(devices: &'a DeviceRegistry, time: UpdateTime, capacity: usize) -> Self {
        Self {
            devices,
            time,
            matrices: MatrixStack::with_capacity(capacity),
            force_transform_update: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> &UpdateTime {
        &self.time
    }

    #[inline]
    #[must_use]
    pub fn devices(&self) -> &'a DeviceRegistry {
        self.devices
    }

    pub fn active_devices(&self) -> impl Iterator<Item = &'a RenderDevice> + 'a {
        self.devices.active()
    }

    /// Parent world matrix of the node currently being visited.
    #[inline]
    #[must_use]
    pub fn parent_world(&self) -> Mat4 {
        self.matrices.top()
    }

    /// Set while an ancestor recomputed its world matrix this frame.
    #[inline]
    #[must_use]
    pub fn force_transform_update(&self) -> bool {
        self.force_transform_update
    }

    /// Replaces the flag and returns the previous value, to be restored once
    /// the children have been visited.
    #[inline]
    pub(crate) fn replace_force_flag(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.force_transform_update, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_stack_reads_identity() {
        let mut stack = MatrixStack::default();
        assert_eq!(stack.top(), Mat4::IDENTITY);
        let m = Mat4::from_translation(Vec3::X);
        stack.push(m);
        assert_eq!(stack.top(), m);
        assert_eq!(stack.pop(), Some(m));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn force_flag_is_restorable() {
        let devices = DeviceRegistry::new(1);
        let mut state = UpdateState::new(&devices, UpdateTime::default());
        let previous = state.replace_force_flag(true);
        assert!(!previous);
        assert!(state.force_transform_update());
        state.replace_force_flag(previous);
        assert!(!state.force_transform_update());
    }
}
