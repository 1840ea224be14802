use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use smallvec::SmallVec;

use crate::core::device::{DeviceIndex, RenderDevice};
use crate::core::math::{Color, WHITE};
use crate::errors::Result;
use crate::render::pass::PassId;
use crate::resources::{ResourceDictionary, ResourceKey};
use crate::scene::node::Node;
use crate::scene::spatial::ObjectConstants;
use crate::scene::view::{ViewId, ViewInformation};
use crate::scene::{LayerId, NodeHandle};

/// One subscribed node as seen by its draw callback.
pub struct DrawItem<'a> {
    pub handle: NodeHandle,
    pub node: &'a Node,
    pub layer: LayerId,
    pub pass: PassId,
}

/// Everything a draw callback may touch while one view renders one pass.
///
/// Resources are read-only here: loading happens during update only.
pub struct RenderContext<'a> {
    pub device: &'a RenderDevice,
    pub view: &'a ViewInformation,
    pub resources: &'a ResourceDictionary,
    pub layer: LayerId,
    pub pass: PassId,
    pub(crate) record: &'a mut FrameRecord,
}

impl RenderContext<'_> {
    #[inline]
    #[must_use]
    pub fn device_index(&self) -> DeviceIndex {
        self.device.index()
    }

    /// Records a draw in the frame's command list.
    pub fn submit(&mut self, command: DrawCommand) {
        self.record.commands.push(command);
    }
}

/// A recorded draw. The actual GPU submission belongs to the device backend;
/// the core only records what would be drawn, where and with what.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeHandle,
    pub layer: LayerId,
    pub pass: PassId,
    pub world: Mat4,
    pub opacity: f32,
    pub color: Color,
    pub resources: SmallVec<[ResourceKey; 4]>,
}

impl DrawCommand {
    /// A command for `item`, filled from the node's transform state if it
    /// has one.
    #[must_use]
    pub fn for_item(item: &DrawItem<'_>) -> Self {
        let (world, opacity, color) = match item.node.spatial() {
            Some(spatial) => (spatial.world_matrix(), spatial.opacity(), spatial.color()),
            None => (Mat4::IDENTITY, 1.0, WHITE),
        };
        Self {
            node: item.handle,
            layer: item.layer,
            pass: item.pass,
            world,
            opacity,
            color,
            resources: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_resource(mut self, key: ResourceKey) -> Self {
        self.resources.push(key);
        self
    }
}

/// Output of rendering one view for one frame.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub view: ViewId,
    pub device: DeviceIndex,
    pub frame: u64,
    pub commands: Vec<DrawCommand>,
    /// Shader constants uploaded during this frame, per node.
    pub uploads: Vec<(NodeHandle, ObjectConstants)>,
}

impl FrameRecord {
    #[must_use]
    pub fn new(view: ViewId, device: DeviceIndex, frame: u64) -> Self {
        Self {
            view,
            device,
            frame,
            commands: Vec::new(),
            uploads: Vec::new(),
        }
    }

    pub fn commands_in(&self, pass: PassId) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(move |command| command.pass == pass)
    }

    /// Nodes drawn in `pass`, in draw order.
    #[must_use]
    pub fn nodes_in(&self, pass: PassId) -> Vec<NodeHandle> {
        self.commands_in(pass).map(|command| command.node).collect()
    }

    #[must_use]
    pub fn draws(&self, node: NodeHandle) -> usize {
        self.commands.iter().filter(|command| command.node == node).count()
    }
}

type DrawFn = dyn Fn(&DrawItem<'_>, &mut RenderContext<'_>) -> Result<()> + Send + Sync;

/// Callback invoked for every subscription of a pass while it renders.
#[derive(Clone)]
pub struct DrawCallback(Arc<DrawFn>);

impl DrawCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DrawItem<'_>, &mut RenderContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Forwards to the node's own [`Drawable::render`](crate::scene::Drawable::render).
    #[must_use]
    pub fn content() -> Self {
        Self::new(|item, ctx| match item.node.content() {
            Some(content) => content.render(item, ctx),
            None => Ok(()),
        })
    }

    #[inline]
    pub fn invoke(&self, item: &DrawItem<'_>, ctx: &mut RenderContext<'_>) -> Result<()> {
        (self.0)(item, ctx)
    }
}

impl fmt::Debug for DrawCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DrawCallback")
    }
}
