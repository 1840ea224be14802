//! Transform-bearing state of a spatial node.
//!
//! [`Spatial`] owns the node's local transform description, its world
//! matrix, display parameters (opacity, accentuation, color), an optional
//! hosted object and one shader-parameter slot per device.
//!
//! # Change Detection
//!
//! Setters compare against the stored value with
//! [`EQUALITY_TOLERANCE`](crate::core::math::EQUALITY_TOLERANCE) and only
//! mark the transform dirty on a real change. The world matrix is recomputed
//! during update when the local state is dirty, when an ancestor recomputed
//! this frame, or when the node delegates to another node's transform.
//!
//! # Shader Parameters
//!
//! Every recomputation or parameter change flags all device slots. The
//! render pass of a device refreshes its own slot lazily and clears the
//! flag; the flag is atomic because render threads only hold `&Spatial`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use parking_lot::Mutex;

use crate::core::check::{check_finite, check_range};
use crate::core::device::{DeviceIndex, DeviceSlots};
use crate::core::math::{Color, WHITE, nearly_equal, vec3_nearly_equal, vec4_nearly_equal};
use crate::scene::hosted::{HostMode, HostedObject, HostedValues, TransformSource};
use crate::scene::state::UpdateState;
use crate::scene::transform::{Rotation, TransformMode, compose_local};

/// Per-object constants as uploaded to a device.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: Mat4,
    pub color: Vec4,
    pub opacity: f32,
    pub accentuation: f32,
    pub _padding: [f32; 2],
}

struct ShaderParamSlot {
    needs_refresh: AtomicBool,
    constants: Mutex<ObjectConstants>,
    uploads: AtomicU64,
}

impl ShaderParamSlot {
    fn new() -> Self {
        Self {
            needs_refresh: AtomicBool::new(true),
            constants: Mutex::new(ObjectConstants::zeroed()),
            uploads: AtomicU64::new(0),
        }
    }
}

/// Capability of anything that exposes an editable local transform.
///
/// Animation drivers receive their target through this trait.
pub trait Transformable {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    fn rotation(&self) -> Rotation;
    fn set_rotation(&mut self, rotation: Rotation);

    fn scaling(&self) -> Vec3;
    fn set_scaling(&mut self, scaling: Vec3);

    fn world_matrix(&self) -> Mat4;
}

pub struct Spatial {
    position: Vec3,
    rotation: Rotation,
    scaling: Vec3,
    mode: TransformMode,

    opacity: f32,
    accentuation: f32,
    color: Color,

    world: Mat4,

    transform_dirty: bool,
    params_dirty: bool,
    computed_once: bool,
    /// Bumped whenever a value that influences pass selection changes.
    pass_version: u64,

    hosted: Option<HostedObject>,
    shader_params: DeviceSlots<ShaderParamSlot>,
}

impl Default for Spatial {
    fn default() -> Self {
        Self::new()
    }
}

impl Spatial {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Rotation::default(),
            scaling: Vec3::ONE,
            mode: TransformMode::default(),
            opacity: 1.0,
            accentuation: 0.0,
            color: WHITE,
            world: Mat4::IDENTITY,
            transform_dirty: true,
            params_dirty: true,
            computed_once: false,
            pass_version: 0,
            hosted: None,
            shader_params: DeviceSlots::new(),
        }
    }

    // ========================================================================
    // Transform
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        if !vec3_nearly_equal(self.position, position) {
            self.position = position;
            self.transform_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        if !self.rotation.nearly_equals(&rotation) {
            self.rotation = rotation;
            self.transform_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    pub fn set_scaling(&mut self, scaling: Vec3) {
        if !vec3_nearly_equal(self.scaling, scaling) {
            self.scaling = scaling;
            self.transform_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn transform_mode(&self) -> TransformMode {
        self.mode
    }

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        if self.mode != mode {
            self.mode = mode;
            self.transform_dirty = true;
        }
    }

    /// World matrix as of the last update.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    /// Local state changed and the world matrix is stale.
    #[inline]
    #[must_use]
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    /// Re-parenting changes the world matrix without touching local state.
    /// A static node computes once more under its new parent.
    pub(crate) fn mark_reparented(&mut self) {
        self.transform_dirty = true;
        self.computed_once = false;
    }

    // ========================================================================
    // Display parameters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clamped to `[0, 1]`. A change may move the node to another pass.
    pub fn set_opacity(&mut self, opacity: f32) {
        check_finite(opacity, "opacity");
        let opacity = opacity.clamp(0.0, 1.0);
        if !nearly_equal(self.opacity, opacity) {
            self.opacity = opacity;
            self.params_dirty = true;
            self.pass_version += 1;
        }
    }

    #[inline]
    #[must_use]
    pub fn accentuation(&self) -> f32 {
        self.accentuation
    }

    pub fn set_accentuation(&mut self, accentuation: f32) {
        check_range(accentuation, 0.0, 1.0, "accentuation");
        if !nearly_equal(self.accentuation, accentuation) {
            self.accentuation = accentuation;
            self.params_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        if !vec4_nearly_equal(self.color, color) {
            self.color = color;
            self.params_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn pass_version(&self) -> u64 {
        self.pass_version
    }

    // ========================================================================
    // Hosted object
    // ========================================================================

    /// Lets `source` drive this node's transform from the next update on.
    pub fn set_hosted_object(&mut self, source: Arc<dyn TransformSource>, mode: HostMode) {
        self.hosted = Some(HostedObject::new(source, mode));
        self.transform_dirty = true;
    }

    /// Detaches the hosted object and restores default transform and
    /// display values.
    pub fn reset_hosted_object(&mut self) {
        if self.hosted.take().is_none() {
            return;
        }
        self.position = Vec3::ZERO;
        self.rotation = Rotation::default();
        self.scaling = Vec3::ONE;
        self.color = WHITE;
        self.accentuation = 0.0;
        if !nearly_equal(self.opacity, 1.0) {
            self.opacity = 1.0;
            self.pass_version += 1;
        }
        self.transform_dirty = true;
        self.params_dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn has_hosted_object(&self) -> bool {
        self.hosted.is_some()
    }

    #[must_use]
    pub fn host_mode(&self) -> Option<HostMode> {
        self.hosted.as_ref().map(HostedObject::mode)
    }

    fn apply_hosted(&mut self, values: HostedValues) {
        self.set_position(values.position);
        let rotation = Rotation::Euler(values.rotation);
        if !matches!(self.rotation, Rotation::Euler(current) if vec3_nearly_equal(current, values.rotation)) {
            self.rotation = rotation;
            self.transform_dirty = true;
        }
        self.set_scaling(values.scaling);
        self.set_opacity(values.opacity);
        self.set_color(values.color);
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Runs the transform pipeline for one frame.
    ///
    /// `source_world` is the world matrix of the node named by
    /// [`TransformMode::TakeFromOther`], resolved by the caller.
    /// Returns whether the world matrix was recomputed.
    pub(crate) fn update(&mut self, state: &UpdateState<'_>, is_static: bool, source_world: Option<Mat4>) -> bool {
        let forced = state.force_transform_update();
        let frozen = is_static && self.computed_once && !forced;

        if !frozen && let Some(hosted) = &self.hosted {
            let values = hosted.sample();
            self.apply_hosted(values);
        }

        let delegating = self.mode.source().is_some();
        let needs_recompute = self.transform_dirty || forced || delegating || !self.computed_once;

        let mut recomputed = false;
        if needs_recompute && !frozen {
            let local = compose_local(&self.mode, self.position, &self.rotation, self.scaling)
                .unwrap_or_else(|| source_world.unwrap_or(Mat4::IDENTITY));
            self.world = state.parent_world() * local;
            self.transform_dirty = false;
            self.computed_once = true;
            self.params_dirty = true;
            recomputed = true;
        }

        if self.params_dirty {
            self.mark_shader_params_dirty();
            self.params_dirty = false;
        }
        recomputed
    }

    // ========================================================================
    // Per-device shader parameters
    // ========================================================================

    /// Creates the slot for `device` if missing. New slots start dirty.
    pub(crate) fn ensure_device(&mut self, device: DeviceIndex) {
        self.shader_params.get_or_insert_with(device, ShaderParamSlot::new);
    }

    pub(crate) fn release_device(&mut self, device: DeviceIndex) {
        self.shader_params.remove(device);
    }

    pub(crate) fn release_all_devices(&mut self) {
        self.shader_params.clear();
    }

    fn mark_shader_params_dirty(&self) {
        for (_, slot) in self.shader_params.iter() {
            slot.needs_refresh.store(true, Ordering::Release);
        }
    }

    /// Whether the constants of `device` are stale. `false` if the node has
    /// no slot for that device.
    #[must_use]
    pub fn needs_refresh(&self, device: DeviceIndex) -> bool {
        self.shader_params
            .get(device)
            .is_some_and(|slot| slot.needs_refresh.load(Ordering::Acquire))
    }

    /// Re-packs the constants of `device` if they are stale.
    /// Returns the freshly uploaded constants, or `None` if nothing was done.
    pub fn refresh_shader_params(&self, device: DeviceIndex) -> Option<ObjectConstants> {
        let slot = self.shader_params.get(device)?;
        if !slot.needs_refresh.swap(false, Ordering::AcqRel) {
            return None;
        }
        let constants = self.pack_constants();
        *slot.constants.lock() = constants;
        slot.uploads.fetch_add(1, Ordering::Relaxed);
        Some(constants)
    }

    /// Constants last uploaded to `device`.
    #[must_use]
    pub fn uploaded_constants(&self, device: DeviceIndex) -> Option<ObjectConstants> {
        self.shader_params.get(device).map(|slot| *slot.constants.lock())
    }

    /// Number of uploads performed for `device`.
    #[must_use]
    pub fn upload_count(&self, device: DeviceIndex) -> u64 {
        self.shader_params
            .get(device)
            .map_or(0, |slot| slot.uploads.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn has_device_slot(&self, device: DeviceIndex) -> bool {
        self.shader_params.contains(device)
    }

    fn pack_constants(&self) -> ObjectConstants {
        ObjectConstants {
            world: self.world,
            color: self.color,
            opacity: self.opacity,
            accentuation: self.accentuation,
            _padding: [0.0; 2],
        }
    }
}

impl Transformable for Spatial {
    fn position(&self) -> Vec3 {
        Spatial::position(self)
    }

    fn set_position(&mut self, position: Vec3) {
        Spatial::set_position(self, position);
    }

    fn rotation(&self) -> Rotation {
        Spatial::rotation(self)
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        Spatial::set_rotation(self, rotation);
    }

    fn scaling(&self) -> Vec3 {
        Spatial::scaling(self)
    }

    fn set_scaling(&mut self, scaling: Vec3) {
        Spatial::set_scaling(self, scaling);
    }

    fn world_matrix(&self) -> Mat4 {
        Spatial::world_matrix(self)
    }
}

impl std::fmt::Debug for Spatial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spatial")
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scaling", &self.scaling)
            .field("mode", &self.mode)
            .field("opacity", &self.opacity)
            .field("hosted", &self.hosted)
            .finish_non_exhaustive()
    }
}
