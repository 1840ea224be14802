use glam::Vec2;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::core::device::{DeviceIndex, DeviceRegistry, RenderDevice};
use crate::errors::{Result, StrataError};
use crate::render::context::{DrawItem, FrameRecord, RenderContext};
use crate::render::pass::PassOrder;
use crate::render::picking::{PickHit, PickOptions};
use crate::render::subset::{PassSubscriptionSink, RenderPassSubset};
use crate::resources::ResourceDictionary;
use crate::scene::layer::{DEFAULT_LAYER_NAME, Layer};
use crate::scene::node::{Node, ViewRecord};
use crate::scene::spatial::Spatial;
use crate::scene::state::{UpdateState, UpdateTime};
use crate::scene::transform_system;
use crate::scene::view::{ViewId, ViewInformation};
use crate::scene::{LayerId, NodeHandle, NodeKey, SceneId};
use crate::settings::EngineSettings;

/// Scene graph container.
///
/// Owns every attached node, the layers partitioning the root nodes, the
/// resource dictionary shared by all nodes of the scene and one
/// [`RenderPassSubset`] per registered view and layer.
///
/// # Frame phases
///
/// 1. [`update`](Self::update) once per frame (`&mut self`, single thread)
/// 2. [`update_for_view`](Self::update_for_view) once per registered view
/// 3. [`render`](Self::render) once per view (`&self`, may run concurrently)
pub struct Scene {
    id: SceneId,

    nodes: SlotMap<NodeKey, Node>,
    layers: SlotMap<LayerId, Layer>,
    /// Layer ids sorted by render order.
    layer_order: Vec<LayerId>,
    default_layer: LayerId,

    resources: ResourceDictionary,

    /// Registered views and the device each renders with.
    views: FxHashMap<ViewId, DeviceIndex>,
    subsets: FxHashMap<(ViewId, LayerId), RenderPassSubset>,

    initial_visibility: bool,
    matrix_stack_capacity: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(&EngineSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: &EngineSettings) -> Self {
        let mut layers = SlotMap::with_key();
        let default_layer = layers.insert_with_key(|id| Layer::new(id, DEFAULT_LAYER_NAME.to_string(), 0));
        Self {
            id: SceneId::next(),
            nodes: SlotMap::with_key(),
            layers,
            layer_order: vec![default_layer],
            default_layer,
            resources: ResourceDictionary::new(),
            views: FxHashMap::default(),
            subsets: FxHashMap::default(),
            initial_visibility: settings.initial_visibility,
            matrix_stack_capacity: settings.matrix_stack_capacity,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn resources(&self) -> &ResourceDictionary {
        &self.resources
    }

    #[inline]
    pub fn resources_mut(&mut self) -> &mut ResourceDictionary {
        &mut self.resources
    }

    // ========================================================================
    // Layers
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    pub fn add_layer(&mut self, name: &str, order: i32) -> Result<LayerId> {
        crate::core::check::check_not_empty(name, "layer name");
        if self.layer_by_name(name).is_some() {
            return Err(StrataError::DuplicateLayer(name.to_string()));
        }
        let id = self
            .layers
            .insert_with_key(|id| Layer::new(id, name.to_string(), order));

        // Stable: a new layer goes after existing layers of equal order.
        let position = self
            .layer_order
            .partition_point(|existing| self.layers[*existing].order() <= order);
        self.layer_order.insert(position, id);

        let views: SmallVec<[ViewId; 4]> = self.views.keys().copied().collect();
        for view in views {
            self.subsets.insert((view, id), RenderPassSubset::new(view, id));
        }
        log::debug!("Scene {:?}: added layer '{name}' (order {order})", self.id);
        Ok(id)
    }

    /// Removes an empty layer. The default layer cannot be removed.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<()> {
        let layer = self.layers.get(id).ok_or(StrataError::LayerNotFound(id))?;
        if !layer.is_empty() || id == self.default_layer {
            return Err(StrataError::LayerNotEmpty(id));
        }
        self.layers.remove(id);
        self.layer_order.retain(|existing| *existing != id);
        self.subsets.retain(|(_, layer), _| *layer != id);
        Ok(())
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    #[must_use]
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.values().find(|layer| layer.name() == name)
    }

    /// Layers in render order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layer_order.iter().filter_map(|id| self.layers.get(*id))
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Attaches a detached node as a root of the default layer.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let layer = self.default_layer;
        self.insert_node(node, layer)
    }

    /// Attaches a detached node as a root of `layer`.
    pub fn add_node_to_layer(&mut self, node: Node, layer: LayerId) -> Result<NodeHandle> {
        if !self.layers.contains_key(layer) {
            return Err(StrataError::LayerNotFound(layer));
        }
        Ok(self.insert_node(node, layer))
    }

    /// Attaches a detached node directly below `parent`, in the parent's layer.
    pub fn add_node_under(&mut self, node: Node, parent: NodeHandle) -> Result<NodeHandle> {
        let parent_key = self.key_of(parent)?;
        let layer = self.nodes[parent_key].layer.unwrap_or(self.default_layer);
        let handle = self.insert_node(node, layer);
        if let Err(err) = self.add_child(parent, handle) {
            // Roll back the insertion so a failed call leaves no trace.
            let _ = self.remove_node(handle);
            return Err(err);
        }
        Ok(handle)
    }

    fn insert_node(&mut self, mut node: Node, layer: LayerId) -> NodeHandle {
        debug_assert!(node.scene.is_none(), "node values are detached by construction");
        node.clear_scene_state();
        node.scene = Some(self.id);
        node.layer = Some(layer);
        if let Some(content) = node.content.as_mut() {
            content.on_added_to_scene(self.id);
        }
        if self.initial_visibility {
            for view in self.views.keys() {
                node.views.insert(
                    *view,
                    ViewRecord {
                        visible: true,
                        evaluated: true,
                        subscribed_version: None,
                    },
                );
            }
        }

        let key = self.nodes.insert(node);
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.roots.push(key);
            layer.node_count += 1;
        }
        let handle = NodeHandle::new(self.id, key);
        log::trace!("Scene {:?}: attached {handle:?}", self.id);
        handle
    }

    /// Detaches `handle` and its whole subtree from the scene.
    ///
    /// Every per-device resource of the subtree is released, subscriptions
    /// are dropped and `on_removed_from_scene` runs. The returned node is
    /// detached again; its children are dropped with their resources
    /// already released.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<Node> {
        let key = self.key_of(handle)?;

        if let Some(parent) = self.nodes[key].parent {
            if let Some(parent) = self.nodes.get_mut(parent) {
                parent.children.retain(|child| *child != key);
            }
        } else if let Some(layer) = self.nodes[key].layer.and_then(|layer| self.layers.get_mut(layer)) {
            layer.roots.retain(|root| *root != key);
        }

        let subtree = self.collect_subtree(key);
        let mut root = None;
        for node_key in subtree.iter().rev() {
            let Some(mut node) = self.nodes.remove(*node_key) else {
                continue;
            };
            self.detach_node_state(NodeHandle::new(self.id, *node_key), &mut node);
            if *node_key == key {
                root = Some(node);
            }
        }
        log::trace!("Scene {:?}: detached {handle:?} ({} nodes)", self.id, subtree.len());
        root.ok_or(StrataError::NodeNotFound(handle))
    }

    fn detach_node_state(&mut self, handle: NodeHandle, node: &mut Node) {
        if let Some(content) = node.content.as_mut() {
            content.unload_all_resources(&mut self.resources);
            content.on_removed_from_scene(self.id);
        }
        if let Some(spatial) = node.spatial.as_mut() {
            spatial.release_all_devices();
        }
        for subset in self.subsets.values_mut() {
            subset.unsubscribe_all(handle);
        }
        if let Some(layer) = node.layer.and_then(|layer| self.layers.get_mut(layer)) {
            layer.node_count = layer.node_count.saturating_sub(1);
        }
        node.clear_scene_state();
    }

    /// Makes `child` a child of `parent`.
    ///
    /// Both must be attached to this scene and to the same layer; `child`
    /// must be a root (not parented yet) and must not be an ancestor of
    /// `parent`.
    pub fn add_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        if parent == child {
            return Err(StrataError::SelfParenting(child));
        }
        if parent.scene() != child.scene() {
            return Err(StrataError::CrossSceneParenting {
                child,
                child_scene: child.scene(),
                parent_scene: parent.scene(),
            });
        }
        let parent_key = self.key_of(parent)?;
        let child_key = self.key_of(child)?;

        let parent_layer = self.nodes[parent_key].layer.unwrap_or(self.default_layer);
        let child_layer = self.nodes[child_key].layer.unwrap_or(self.default_layer);
        if parent_layer != child_layer {
            return Err(StrataError::LayerMismatch {
                child,
                child_layer,
                parent_layer,
            });
        }
        if self.nodes[parent_key].children.contains(&child_key) {
            return Err(StrataError::DuplicateChild { parent, child });
        }
        if let Some(current) = self.nodes[child_key].parent {
            return Err(StrataError::AlreadyParented {
                child,
                current_parent: NodeHandle::new(self.id, current),
            });
        }
        if self.is_ancestor_key(child_key, parent_key) {
            return Err(StrataError::CycleDetected { parent, child });
        }

        if let Some(layer) = self.layers.get_mut(child_layer) {
            layer.roots.retain(|root| *root != child_key);
        }
        self.nodes[parent_key].children.push(child_key);
        let child_node = &mut self.nodes[child_key];
        child_node.parent = Some(parent_key);
        if let Some(spatial) = child_node.spatial.as_mut() {
            spatial.mark_reparented();
        }
        Ok(())
    }

    /// Detaches `child` from `parent`. The child stays in the scene as a
    /// root of its layer.
    pub fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        let parent_key = self.key_of(parent)?;
        let child_key = self.key_of(child)?;
        if self.nodes[child_key].parent != Some(parent_key) {
            return Err(StrataError::NotAChild { parent, child });
        }

        self.nodes[parent_key].children.retain(|key| *key != child_key);
        let child_node = &mut self.nodes[child_key];
        child_node.parent = None;
        if let Some(spatial) = child_node.spatial.as_mut() {
            spatial.mark_reparented();
        }
        let layer = child_node.layer.unwrap_or(self.default_layer);
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.roots.push(child_key);
        }
        Ok(())
    }

    /// `true` if `ancestor` is `node` itself or lies on its parent chain.
    /// Walks up from `node`, so the cost is the depth of `node`.
    pub fn is_parent_of(&self, ancestor: NodeHandle, node: NodeHandle) -> Result<bool> {
        let ancestor = self.key_of(ancestor)?;
        let node = self.key_of(node)?;
        Ok(self.is_ancestor_key(ancestor, node))
    }

    fn is_ancestor_key(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    /// Node keys of the subtree rooted at `root`, parents before children.
    fn collect_subtree(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(key) {
                out.push(key);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Node keys of one layer in depth-first order.
    fn collect_layer(&self, layer: LayerId) -> Vec<NodeKey> {
        let Some(layer) = self.layers.get(layer) else {
            return Vec::new();
        };
        layer
            .roots
            .iter()
            .flat_map(|root| self.collect_subtree(*root))
            .collect()
    }

    // ========================================================================
    // Node access
    // ========================================================================

    fn key_of(&self, handle: NodeHandle) -> Result<NodeKey> {
        if handle.scene() == self.id && self.nodes.contains_key(handle.key()) {
            Ok(handle.key())
        } else {
            Err(StrataError::NodeNotFound(handle))
        }
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.key_of(handle).is_ok()
    }

    pub fn node(&self, handle: NodeHandle) -> Result<&Node> {
        let key = self.key_of(handle)?;
        Ok(&self.nodes[key])
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        let key = self.key_of(handle)?;
        Ok(&mut self.nodes[key])
    }

    pub fn spatial(&self, handle: NodeHandle) -> Result<&Spatial> {
        self.node(handle)?.spatial().ok_or(StrataError::NotSpatial(handle))
    }

    pub fn spatial_mut(&mut self, handle: NodeHandle) -> Result<&mut Spatial> {
        self.node_mut(handle)?
            .spatial_mut()
            .ok_or(StrataError::NotSpatial(handle))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        let scene = self.id;
        self.nodes.iter().map(move |(key, node)| (NodeHandle::new(scene, key), node))
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.iter_nodes()
            .find(|(_, node)| node.name() == Some(name))
            .map(|(handle, _)| handle)
    }

    /// Root handles of `layer`.
    pub fn roots(&self, layer: LayerId) -> Result<Vec<NodeHandle>> {
        let layer = self.layers.get(layer).ok_or(StrataError::LayerNotFound(layer))?;
        Ok(layer.roots.iter().map(|key| NodeHandle::new(self.id, *key)).collect())
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Fails unless `view` is bound to this scene and registered.
    pub fn check_view(&self, view: &ViewInformation) -> Result<()> {
        if view.scene() != self.id {
            return Err(StrataError::ViewNotBound {
                view: view.id(),
                view_scene: view.scene(),
                scene: self.id,
            });
        }
        if !self.views.contains_key(&view.id()) {
            return Err(StrataError::ViewNotRegistered(view.id()));
        }
        Ok(())
    }

    /// Creates the per-layer subsets of `view`. Registering twice is a no-op.
    pub fn register_view(&mut self, view: &ViewInformation) -> Result<()> {
        if view.scene() != self.id {
            return Err(StrataError::ViewNotBound {
                view: view.id(),
                view_scene: view.scene(),
                scene: self.id,
            });
        }
        if self.views.insert(view.id(), view.device()).is_some() {
            return Ok(());
        }
        for layer in &self.layer_order {
            self.subsets
                .insert((view.id(), *layer), RenderPassSubset::new(view.id(), *layer));
        }
        log::debug!("Scene {:?}: registered {:?} on {:?}", self.id, view.id(), view.device());
        Ok(())
    }

    /// Drops the subsets of `view` and its record on every node.
    pub fn unregister_view(&mut self, view: &ViewInformation) -> Result<()> {
        self.check_view(view)?;
        let id = view.id();
        self.views.remove(&id);
        self.subsets.retain(|(view, _), _| *view != id);
        for node in self.nodes.values_mut() {
            node.views.remove(id);
        }
        log::debug!("Scene {:?}: unregistered {id:?}", self.id);
        Ok(())
    }

    #[must_use]
    pub fn is_view_registered(&self, view: ViewId) -> bool {
        self.views.contains_key(&view)
    }

    pub fn registered_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    /// Visibility of `handle` in `view` as of the last visibility pass.
    /// `false` until a pass or [`try_set_initial_visibility`](Self::try_set_initial_visibility)
    /// marked it visible.
    pub fn is_visible(&self, handle: NodeHandle, view: &ViewInformation) -> Result<bool> {
        self.check_view(view)?;
        Ok(self.node(handle)?.is_visible_in(view.id()))
    }

    /// Marks `handle` visible in `view` if no visibility pass evaluated it
    /// yet. Returns whether the record was changed.
    pub fn try_set_initial_visibility(&mut self, handle: NodeHandle, view: &ViewInformation) -> Result<bool> {
        self.check_view(view)?;
        let node = self.node_mut(handle)?;
        let record = node.views.get_or_insert_with(view.id(), ViewRecord::default);
        if record.evaluated {
            return Ok(false);
        }
        record.visible = true;
        record.evaluated = true;
        Ok(true)
    }

    pub fn subset(&self, view: ViewId, layer: LayerId) -> Result<&RenderPassSubset> {
        self.subsets
            .get(&(view, layer))
            .ok_or(StrataError::ViewNotRegistered(view))
    }

    // ========================================================================
    // Frame phases
    // ========================================================================

    /// Update pass: loads missing device resources, advances animations and
    /// recomputes world matrices, depth-first over every layer in order.
    pub fn update(&mut self, state: &mut UpdateState<'_>) -> Result<()> {
        let roots: Vec<NodeKey> = self
            .layer_order
            .iter()
            .filter_map(|id| self.layers.get(*id))
            .flat_map(|layer| layer.roots.iter().copied())
            .collect();
        transform_system::update_hierarchy(self.id, &mut self.nodes, &roots, &mut self.resources, state)
    }

    /// [`update`](Self::update) with a fresh traversal state.
    pub fn update_frame(&mut self, devices: &DeviceRegistry, time: UpdateTime) -> Result<()> {
        let mut state = UpdateState::with_stack_capacity(devices, time, self.matrix_stack_capacity);
        self.update(&mut state)
    }

    /// Visibility pass for one view.
    ///
    /// Evaluates detail level and the view's filters for every node, then
    /// (re)subscribes visible nodes whose pass state changed since their
    /// last subscription and drops the subscriptions of hidden nodes.
    /// Nodes whose state did not change are left alone.
    pub fn update_for_view(&mut self, view: &ViewInformation) -> Result<()> {
        self.check_view(view)?;
        let view_id = view.id();
        let layers = self.layer_order.clone();

        for layer_id in layers {
            let keys = self.collect_layer(layer_id);
            let Some(subset) = self.subsets.get_mut(&(view_id, layer_id)) else {
                continue;
            };

            for key in keys {
                let handle = NodeHandle::new(self.id, key);
                let node = &mut self.nodes[key];

                let visible = {
                    let node: &Node = node;
                    node.target_detail_level().intersects(view.detail_level)
                        && view.filters().iter().all(|filter| filter.is_visible(node, view))
                };

                let record = node.views.get_or_insert_with(view_id, ViewRecord::default);
                record.visible = visible;
                record.evaluated = true;
                let subscribed_version = record.subscribed_version;

                if !visible {
                    if subscribed_version.is_some() {
                        subset.unsubscribe_all(handle);
                        record.subscribed_version = None;
                    }
                    continue;
                }

                let version = node.pass_state_version();
                let first_time = subset.count_subscriptions(handle) == 0 && subscribed_version.is_none();
                if !first_time && subscribed_version == Some(version) {
                    continue;
                }

                subset.unsubscribe_all(handle);
                if let Some(content) = node.content() {
                    let mut sink = PassSubscriptionSink::new(&mut *subset, handle);
                    content.subscribe_passes(node, &mut sink);
                }
                if let Some(record) = node.views.get_mut(view_id) {
                    record.subscribed_version = Some(version);
                }
            }
        }
        Ok(())
    }

    /// Render pass for one view: layers in order, passes in `order`, every
    /// subscription's callback. Shader constants of the view's device are
    /// refreshed lazily before a node is drawn.
    pub fn render(
        &self,
        view: &ViewInformation,
        device: &RenderDevice,
        order: &PassOrder,
        record: &mut FrameRecord,
    ) -> Result<()> {
        self.check_view(view)?;
        device.ensure_active()?;
        crate::debug_check!(view.device() == device.index(), "view rendered on a foreign device");

        let device_index = device.index();
        for layer in &self.layer_order {
            let Some(subset) = self.subsets.get(&(view.id(), *layer)) else {
                continue;
            };
            for pass in order.iter() {
                for (handle, callback) in subset.iter_pass(pass) {
                    let Some(node) = self.nodes.get(handle.key()) else {
                        continue;
                    };
                    if let Some(spatial) = node.spatial()
                        && let Some(constants) = spatial.refresh_shader_params(device_index)
                    {
                        record.uploads.push((handle, constants));
                    }
                    let item = DrawItem {
                        handle,
                        node,
                        layer: *layer,
                        pass,
                    };
                    let mut ctx = RenderContext {
                        device,
                        view,
                        resources: &self.resources,
                        layer: *layer,
                        pass,
                        record: &mut *record,
                    };
                    callback.invoke(&item, &mut ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Nearest visible pickable node hit by `point` (normalized screen
    /// coordinates of `view`).
    pub fn pick(&self, view: &ViewInformation, point: Vec2, options: &PickOptions) -> Result<Option<PickHit>> {
        self.check_view(view)?;
        let ray = view.pick_ray(point);

        let mut best: Option<PickHit> = None;
        for (key, node) in &self.nodes {
            if !node.is_visible_in(view.id()) {
                continue;
            }
            if options.layer.is_some() && node.layer() != options.layer {
                continue;
            }
            let Some(pickable) = node.content().and_then(|content| content.pickable()) else {
                continue;
            };
            let world = node.world_matrix().unwrap_or(glam::Mat4::IDENTITY);
            let local_ray = ray.transform(&world.inverse());

            let hit = if options.bounding_box_only {
                pickable.pick_bounds().and_then(|bounds| bounds.intersect_ray(&local_ray))
            } else {
                pickable.pick_exact(&local_ray)
            };
            let Some(distance) = hit else {
                continue;
            };
            if options.max_distance.is_some_and(|max| distance > max) {
                continue;
            }
            if best.is_none_or(|current| distance < current.distance) {
                best = Some(PickHit {
                    node: NodeHandle::new(self.id, key),
                    distance,
                    point: ray.at(distance),
                });
            }
        }
        Ok(best)
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Releases everything held for `device`: content resources, shader
    /// parameter slots and the dictionary entries.
    pub fn unload_device(&mut self, device: DeviceIndex) {
        for node in self.nodes.values_mut() {
            if let Some(content) = node.content.as_mut() {
                content.unload_resources(device, &mut self.resources);
            }
            if let Some(spatial) = node.spatial.as_mut() {
                spatial.release_device(device);
            }
        }
        let cleared = self.resources.clear_device(device);
        log::debug!("Scene {:?}: unloaded {device:?} ({cleared} leftover resources)", self.id);
    }

    /// Views registered on `device`.
    pub fn views_on(&self, device: DeviceIndex) -> impl Iterator<Item = ViewId> + '_ {
        self.views
            .iter()
            .filter(move |(_, d)| **d == device)
            .map(|(view, _)| *view)
    }

    pub(crate) fn forget_view(&mut self, id: ViewId) {
        self.views.remove(&id);
        self.subsets.retain(|(view, _), _| *view != id);
        for node in self.nodes.values_mut() {
            node.views.remove(id);
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(content) = node.content.as_mut() {
                content.unload_all_resources(&mut self.resources);
            }
        }
        self.resources.clear();
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("layers", &self.layer_order.len())
            .field("views", &self.views.len())
            .field("resources", &self.resources)
            .finish()
    }
}
