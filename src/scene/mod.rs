//! Scene graph
//!
//! - [`Scene`]: node container, layers, per-view render subsets and the
//!   scene-wide resource dictionary
//! - [`Node`]: hierarchy member with optional [`Spatial`] transform state
//!   and optional [`Drawable`] content
//! - [`ViewInformation`]: a camera rendering one scene on one device
//! - `transform_system`: the depth-first update traversal

pub mod animation;
pub mod drawable;
pub mod filter;
pub mod hosted;
pub mod layer;
pub mod manager;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod spatial;
pub mod state;
pub mod transform;
pub(crate) mod transform_system;
pub mod view;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::new_key_type;

pub use animation::{AnimationDriver, FnAnimation};
pub use drawable::{Drawable, LoadContext, Loadable, PassSubscriber, Pickable};
pub use filter::{DistanceFilter, FrustumFilter, VisibilityFilter};
pub use hosted::{HostMode, TransformSource};
pub use layer::Layer;
pub use manager::SceneManager;
pub use mesh::{MeshObject, ResourceBinding};
pub use node::{DetailLevel, Node};
pub use scene::Scene;
pub use spatial::{ObjectConstants, Spatial, Transformable};
pub use state::{MatrixStack, UpdateState, UpdateTime};
pub use transform::{Rotation, TransformMode};
pub use view::{Camera, ViewId, ViewInformation, Viewport};

new_key_type! {
    /// Key of a node inside its scene's node arena.
    pub struct NodeKey;
    /// Key of a layer inside its scene.
    pub struct LayerId;
}

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique scene identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u32);

impl SceneId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Handle of a node: the owning scene plus the arena key.
///
/// Carrying the scene makes cross-scene misuse detectable instead of
/// silently addressing an unrelated node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    scene: SceneId,
    key: NodeKey,
}

impl NodeHandle {
    pub(crate) fn new(scene: SceneId, key: NodeKey) -> Self {
        Self { scene, key }
    }

    #[inline]
    #[must_use]
    pub fn scene(self) -> SceneId {
        self.scene
    }

    #[inline]
    pub(crate) fn key(self) -> NodeKey {
        self.key
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}:{:?})", self.scene.0, self.key)
    }
}
