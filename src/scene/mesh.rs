//! A ready-made drawable: one geometry and one material resource.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::bounds::BoundingBox;
use crate::core::device::{DeviceIndex, DeviceSlots};
use crate::errors::{Result, StrataError};
use crate::render::context::{DrawCallback, DrawCommand, DrawItem, RenderContext};
use crate::render::pass::PassId;
use crate::render::subset::PassSubscriptionSink;
use crate::resources::{Resource, ResourceDictionary, ResourceKey, SharedResource};
use crate::scene::drawable::{Drawable, LoadContext, Loadable, PassSubscriber, Pickable};
use crate::scene::node::Node;

type ResourceFactory = Arc<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// A resource key plus the factory creating its per-device instances.
#[derive(Clone)]
pub struct ResourceBinding {
    key: ResourceKey,
    factory: ResourceFactory,
}

impl ResourceBinding {
    pub fn new<R, F>(key: ResourceKey, factory: F) -> Self
    where
        R: Resource,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            key,
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Resource>),
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    fn load(&self, ctx: &mut LoadContext<'_>) -> Result<SharedResource<Box<dyn Resource>>> {
        ctx.resources.get_or_load(self.key, ctx.device, || (self.factory)())
    }
}

impl fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceBinding").field(&self.key).finish()
    }
}

struct LoadedMesh {
    _geometry: SharedResource<Box<dyn Resource>>,
    _material: SharedResource<Box<dyn Resource>>,
}

/// Geometry plus material, drawn in the opaque or transparent pass
/// depending on the node's opacity, optionally with a line overlay.
pub struct MeshObject {
    geometry: ResourceBinding,
    material: ResourceBinding,
    bounds: Option<BoundingBox>,
    line_overlay: bool,
    loaded: DeviceSlots<LoadedMesh>,
}

impl MeshObject {
    #[must_use]
    pub fn new(geometry: ResourceBinding, material: ResourceBinding) -> Self {
        Self {
            geometry,
            material,
            bounds: None,
            line_overlay: false,
            loaded: DeviceSlots::new(),
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Also draw in the line pass (wireframe overlay).
    #[must_use]
    pub fn with_line_overlay(mut self, enabled: bool) -> Self {
        self.line_overlay = enabled;
        self
    }

    #[must_use]
    pub fn geometry_key(&self) -> ResourceKey {
        self.geometry.key()
    }

    #[must_use]
    pub fn material_key(&self) -> ResourceKey {
        self.material.key()
    }

    #[must_use]
    pub fn loaded_device_count(&self) -> usize {
        self.loaded.len()
    }
}

impl Loadable for MeshObject {
    fn load_resources(&mut self, ctx: &mut LoadContext<'_>) -> Result<()> {
        let geometry = self.geometry.load(ctx)?;
        let material = match self.material.load(ctx) {
            Ok(material) => material,
            Err(err) => {
                ctx.resources.release(self.geometry.key, ctx.device.index());
                return Err(err);
            }
        };
        self.loaded.insert(
            ctx.device.index(),
            LoadedMesh {
                _geometry: geometry,
                _material: material,
            },
        );
        Ok(())
    }

    fn unload_resources(&mut self, device: DeviceIndex, resources: &mut ResourceDictionary) {
        if self.loaded.remove(device).is_some() {
            resources.release(self.geometry.key, device);
            resources.release(self.material.key, device);
        }
    }

    fn unload_all_resources(&mut self, resources: &mut ResourceDictionary) {
        let devices: SmallVec<[DeviceIndex; 4]> = self.loaded.indices().collect();
        for device in devices {
            self.unload_resources(device, resources);
        }
    }

    fn is_loaded(&self, device: DeviceIndex) -> bool {
        self.loaded.contains(device)
    }
}

impl PassSubscriber for MeshObject {
    fn subscribe_passes(&self, node: &Node, sink: &mut PassSubscriptionSink<'_>) {
        let opacity = node.spatial().map_or(1.0, |spatial| spatial.opacity());
        sink.subscribe(PassId::for_opacity(opacity), DrawCallback::content());
        if self.line_overlay {
            sink.subscribe(PassId::line(), DrawCallback::content());
        }
    }
}

impl Pickable for MeshObject {
    fn pick_bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

impl Drawable for MeshObject {
    fn render(&self, item: &DrawItem<'_>, ctx: &mut RenderContext<'_>) -> Result<()> {
        let device = ctx.device_index();
        if !self.loaded.contains(device) {
            return Err(StrataError::ResourceNotReady {
                key: self.geometry.key,
                device,
            });
        }
        let geometry = ctx.resources.get::<Box<dyn Resource>>(self.geometry.key, device)?;
        let material = ctx.resources.get::<Box<dyn Resource>>(self.material.key, device)?;
        debug_assert!(geometry.read().is_loaded() && material.read().is_loaded());

        ctx.submit(
            DrawCommand::for_item(item)
                .with_resource(self.geometry.key)
                .with_resource(self.material.key),
        );
        Ok(())
    }

    fn local_bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn pickable(&self) -> Option<&dyn Pickable> {
        Some(self)
    }
}

impl fmt::Debug for MeshObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshObject")
            .field("geometry", &self.geometry)
            .field("material", &self.material)
            .field("bounds", &self.bounds)
            .field("loaded_devices", &self.loaded.len())
            .finish()
    }
}
