use std::any::Any;

use bitflags::bitflags;
use glam::Mat4;
use smallvec::SmallVec;

use crate::core::bounds::BoundingBox;
use crate::core::slots::IndexedSlots;
use crate::scene::animation::AnimationDriver;
use crate::scene::drawable::Drawable;
use crate::scene::spatial::Spatial;
use crate::scene::view::ViewId;
use crate::scene::{LayerId, NodeHandle, NodeKey, SceneId};

bitflags! {
    /// Level of detail a node is meant for, or a view renders at.
    ///
    /// A node takes part in a view only if the two intersect.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DetailLevel: u8 {
        const LOW    = 1 << 0;
        const MEDIUM = 1 << 1;
        const HIGH   = 1 << 2;
        const ALL    = Self::LOW.bits() | Self::MEDIUM.bits() | Self::HIGH.bits();
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::ALL
    }
}

/// Per-view bookkeeping of a node.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ViewRecord {
    pub visible: bool,
    /// Set once a visibility pass (or an initial-visibility override) ran.
    pub evaluated: bool,
    /// Pass-state version the current subscriptions were made for.
    pub subscribed_version: Option<u64>,
}

/// A scene graph node.
///
/// # Hierarchy
///
/// - `parent`: `None` for layer roots and detached nodes
/// - `children`: ordered child keys, all in the same scene and layer
///
/// # Components
///
/// - [`Spatial`]: transform state; nodes without it are pure grouping nodes
///   whose children inherit the parent world matrix unchanged
/// - [`Drawable`]: renderable content with its device resources
/// - [`AnimationDriver`]: advanced once per update
pub struct Node {
    name: Option<String>,

    // === Hierarchy ===
    pub(crate) scene: Option<SceneId>,
    pub(crate) layer: Option<LayerId>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: SmallVec<[NodeKey; 4]>,

    // === Behaviour ===
    pub(crate) is_static: bool,
    target_detail_level: DetailLevel,
    pass_version: u64,

    // === Components ===
    pub(crate) spatial: Option<Spatial>,
    pub(crate) content: Option<Box<dyn Drawable>>,
    pub(crate) animation: Option<Box<dyn AnimationDriver>>,

    pub(crate) views: IndexedSlots<ViewId, ViewRecord>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// A grouping node without transform state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            scene: None,
            layer: None,
            parent: None,
            children: SmallVec::new(),
            is_static: false,
            target_detail_level: DetailLevel::ALL,
            pass_version: 0,
            spatial: None,
            content: None,
            animation: None,
            views: IndexedSlots::new(),
        }
    }

    /// A node carrying a default [`Spatial`].
    #[must_use]
    pub fn new_spatial() -> Self {
        Self::new().with_spatial(Spatial::new())
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_spatial(mut self, spatial: Spatial) -> Self {
        self.spatial = Some(spatial);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Drawable) -> Self {
        self.content = Some(Box::new(content));
        self
    }

    #[must_use]
    pub fn with_animation(mut self, driver: impl AnimationDriver + 'static) -> Self {
        self.animation = Some(Box::new(driver));
        self
    }

    #[must_use]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    #[must_use]
    pub fn with_detail_level(mut self, level: DetailLevel) -> Self {
        self.target_detail_level = level;
        self
    }

    // ========================================================================
    // Identity & Hierarchy
    // ========================================================================

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Scene the node is attached to, `None` while detached.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    #[inline]
    #[must_use]
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        Some(NodeHandle::new(self.scene?, self.parent?))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        let scene = self.scene;
        self.children
            .iter()
            .filter_map(move |&key| scene.map(|scene| NodeHandle::new(scene, key)))
    }

    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    // ========================================================================
    // Behaviour
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Static nodes keep their world matrix once it was computed, unless an
    /// ancestor forces a recompute or the node is re-parented.
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    #[inline]
    #[must_use]
    pub fn target_detail_level(&self) -> DetailLevel {
        self.target_detail_level
    }

    pub fn set_target_detail_level(&mut self, level: DetailLevel) {
        self.target_detail_level = level;
    }

    /// Version of everything that influences pass selection. Subscriptions
    /// are rebuilt when it differs from the version they were made for.
    #[must_use]
    pub fn pass_state_version(&self) -> u64 {
        self.pass_version + self.spatial.as_ref().map_or(0, Spatial::pass_version)
    }

    /// Forces subscriptions to be rebuilt on the next visibility pass.
    pub fn mark_pass_state_changed(&mut self) {
        self.pass_version += 1;
    }

    // ========================================================================
    // Components
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        self.spatial.is_some()
    }

    #[inline]
    #[must_use]
    pub fn spatial(&self) -> Option<&Spatial> {
        self.spatial.as_ref()
    }

    #[inline]
    pub fn spatial_mut(&mut self) -> Option<&mut Spatial> {
        self.spatial.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&dyn Drawable> {
        self.content.as_deref()
    }

    /// Mutable access to the content. Pass-relevant edits should be followed
    /// by [`mark_pass_state_changed`](Self::mark_pass_state_changed).
    #[inline]
    pub fn content_mut(&mut self) -> Option<&mut (dyn Drawable + 'static)> {
        self.content.as_deref_mut()
    }

    #[must_use]
    pub fn content_as<T: Drawable>(&self) -> Option<&T> {
        let content: &dyn Any = self.content.as_deref()?;
        content.downcast_ref::<T>()
    }

    /// Replaces the content. Only allowed while detached, since attached
    /// content may hold device resources.
    pub fn set_content(&mut self, content: Option<Box<dyn Drawable>>) -> Option<Box<dyn Drawable>> {
        debug_assert!(self.scene.is_none(), "replace content of detached nodes only");
        self.pass_version += 1;
        std::mem::replace(&mut self.content, content)
    }

    pub fn set_animation(&mut self, driver: Option<Box<dyn AnimationDriver>>) {
        self.animation = driver;
    }

    #[inline]
    #[must_use]
    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }

    /// World matrix of a spatial node, `None` for grouping nodes.
    #[must_use]
    pub fn world_matrix(&self) -> Option<Mat4> {
        self.spatial.as_ref().map(Spatial::world_matrix)
    }

    /// Content bounds in world space.
    #[must_use]
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        let local = self.content.as_ref()?.local_bounds()?;
        Some(match self.world_matrix() {
            Some(world) => local.transform(&world),
            None => local,
        })
    }

    // ========================================================================
    // Per-view state
    // ========================================================================

    /// Visibility as of the last visibility pass for `view`.
    #[must_use]
    pub fn is_visible_in(&self, view: ViewId) -> bool {
        self.views.get(view).is_some_and(|record| record.visible)
    }

    pub(crate) fn clear_scene_state(&mut self) {
        self.scene = None;
        self.layer = None;
        self.parent = None;
        self.children.clear();
        self.views.clear();
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("scene", &self.scene)
            .field("layer", &self.layer)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("is_static", &self.is_static)
            .field("spatial", &self.spatial)
            .field("has_content", &self.content.is_some())
            .finish_non_exhaustive()
    }
}
