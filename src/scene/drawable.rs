//! Capability traits of renderable node content.
//!
//! Content is composed from four small capabilities instead of one deep
//! base type:
//!
//! - [`Loadable`]: creates and drops per-device resources
//! - [`PassSubscriber`]: tells a view which render passes to draw it in
//! - [`Pickable`]: answers ray queries
//! - [`Drawable`]: ties the above together and issues draw commands

use std::any::Any;

use crate::core::bounds::{BoundingBox, Ray};
use crate::core::device::{DeviceIndex, RenderDevice};
use crate::errors::Result;
use crate::render::context::{DrawItem, RenderContext};
use crate::render::subset::PassSubscriptionSink;
use crate::resources::ResourceDictionary;
use crate::scene::SceneId;
use crate::scene::node::Node;

/// What a [`Loadable`] gets to create its resources for one device.
pub struct LoadContext<'a> {
    pub device: &'a RenderDevice,
    pub resources: &'a mut ResourceDictionary,
}

pub trait Loadable {
    /// Loads everything needed to render on `ctx.device`. Called during
    /// update for every active device the content is not yet loaded on.
    fn load_resources(&mut self, ctx: &mut LoadContext<'_>) -> Result<()>;

    /// Drops the resources held for one device.
    fn unload_resources(&mut self, device: DeviceIndex, resources: &mut ResourceDictionary);

    /// Drops the resources held for every device.
    fn unload_all_resources(&mut self, resources: &mut ResourceDictionary);

    fn is_loaded(&self, device: DeviceIndex) -> bool;
}

pub trait PassSubscriber {
    /// Subscribes to the passes this content should be drawn in for one
    /// view. Called when the node becomes visible or its pass state changed;
    /// previous subscriptions are already gone at that point.
    fn subscribe_passes(&self, node: &Node, sink: &mut PassSubscriptionSink<'_>);
}

pub trait Pickable {
    /// Bounds used for coarse picking, in local space.
    fn pick_bounds(&self) -> Option<BoundingBox>;

    /// Exact hit test against a local-space ray. Defaults to the bounds.
    fn pick_exact(&self, ray: &Ray) -> Option<f32> {
        self.pick_bounds()?.intersect_ray(ray)
    }
}

/// Renderable node content.
pub trait Drawable: Loadable + PassSubscriber + Any + Send + Sync {
    /// Issues the draw for one subscribed pass.
    fn render(&self, item: &DrawItem<'_>, ctx: &mut RenderContext<'_>) -> Result<()>;

    /// Local-space bounds for culling.
    fn local_bounds(&self) -> Option<BoundingBox> {
        None
    }

    fn pickable(&self) -> Option<&dyn Pickable> {
        None
    }

    fn on_added_to_scene(&mut self, _scene: SceneId) {}

    fn on_removed_from_scene(&mut self, _scene: SceneId) {}
}
