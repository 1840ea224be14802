//! Strata
//!
//! Scene graph and multi-device rendering-resource core for real-time 3D
//! engines. The crate owns the hierarchy, transform propagation, per-view
//! visibility and pass subscription, and the per-device resource cache.
//! Actual GPU work is left to the [`Drawable`](scene::Drawable) and
//! [`Resource`](resources::Resource) implementations plugged into it.

pub mod core;
pub mod engine;
pub mod errors;
pub mod render;
pub mod resources;
pub mod scene;
pub mod settings;

pub use crate::core::{BoundingBox, DeviceIndex, DeviceRegistry, Ray, RenderDevice};
pub use engine::Engine;
pub use errors::{Result, StrataError};
pub use render::{DrawCallback, FrameRecord, PassId, PassOrder, PickHit, PickOptions};
pub use resources::{Resource, ResourceDictionary, ResourceKey};
pub use scene::{
    Camera, HostMode, LayerId, MeshObject, Node, NodeHandle, Rotation, Scene, SceneId, Spatial,
    TransformMode, TransformSource, ViewId, ViewInformation,
};
pub use settings::EngineSettings;
