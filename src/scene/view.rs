//! Views: one camera rendering one scene on one device.

use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use crate::core::bounds::{Frustum, Ray};
use crate::core::device::DeviceIndex;
use crate::core::slots::SlotIndex;
use crate::scene::SceneId;
use crate::scene::filter::VisibilityFilter;
use crate::scene::node::DetailLevel;

/// Small dense view index; per-node view state is stored by offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl ViewId {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl SlotIndex for ViewId {
    #[inline]
    fn to_offset(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_offset(offset: usize) -> Self {
        Self(offset as u32)
    }
}

/// View and projection matrices (right-handed, depth `[0, 1]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    #[must_use]
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    #[must_use]
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::orthographic_rh(-hw, hw, -hh, hh, near, far),
        }
    }

    #[must_use]
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.look_at(eye, target, up);
        self
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view = Mat4::look_at_rh(eye, target, up);
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position in world space.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }

    #[must_use]
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// World-space ray through a normalized device coordinate, starting on
    /// the near plane with a unit direction.
    #[must_use]
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, (far - near).normalize_or_zero())
    }
}

/// Pixel rectangle of a view's render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Pixel position (origin top-left) to normalized device coordinates.
    #[must_use]
    pub fn to_ndc(&self, pixel: Vec2) -> Vec2 {
        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;
        let u = (pixel.x - self.x as f32) / width;
        let v = (pixel.y - self.y as f32) / height;
        Vec2::new(u * 2.0 - 1.0, 1.0 - v * 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// A view token: identifies the view, the scene it is bound to and the
/// device it renders with, plus the per-frame camera state.
///
/// Scene and device are fixed at creation.
pub struct ViewInformation {
    id: ViewId,
    scene: SceneId,
    device: DeviceIndex,
    pub camera: Camera,
    pub viewport: Viewport,
    pub detail_level: DetailLevel,
    filters: Vec<Arc<dyn VisibilityFilter>>,
}

impl ViewInformation {
    #[must_use]
    pub fn new(id: ViewId, scene: SceneId, device: DeviceIndex) -> Self {
        Self {
            id,
            scene,
            device,
            camera: Camera::default(),
            viewport: Viewport::default(),
            detail_level: DetailLevel::HIGH,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_detail_level(mut self, level: DetailLevel) -> Self {
        self.detail_level = level;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl VisibilityFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> DeviceIndex {
        self.device
    }

    pub fn add_filter(&mut self, filter: Arc<dyn VisibilityFilter>) {
        self.filters.push(filter);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn VisibilityFilter>] {
        &self.filters
    }

    /// World-space picking ray through a normalized screen point
    /// (`[0, 1]²`, origin top-left).
    #[must_use]
    pub fn pick_ray(&self, point: Vec2) -> Ray {
        let ndc = Vec2::new(point.x * 2.0 - 1.0, 1.0 - point.y * 2.0);
        self.camera.ray_from_ndc(ndc)
    }

    /// World-space picking ray through a pixel of the viewport.
    #[must_use]
    pub fn pick_ray_at_pixel(&self, pixel: Vec2) -> Ray {
        self.camera.ray_from_ndc(self.viewport.to_ndc(pixel))
    }
}

impl fmt::Debug for ViewInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewInformation")
            .field("id", &self.id)
            .field("scene", &self.scene)
            .field("device", &self.device)
            .field("viewport", &self.viewport)
            .field("detail_level", &self.detail_level)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::vec3_nearly_equal;

    #[test]
    fn viewport_center_maps_to_ndc_origin() {
        let viewport = Viewport::new(200, 100);
        let ndc = viewport.to_ndc(Vec2::new(100.0, 50.0));
        assert!(ndc.abs_diff_eq(Vec2::ZERO, 1e-6));
        assert!(viewport.to_ndc(Vec2::ZERO).abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-6));
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::perspective(1.0, 1.0, 0.1, 100.0).looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!(vec3_nearly_equal(ray.direction, Vec3::NEG_Z));
        assert!(vec3_nearly_equal(camera.position(), Vec3::new(0.0, 0.0, 10.0)));
    }
}
