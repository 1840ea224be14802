//! Error Types
//!
//! This module defines the error types used throughout the engine core.
//!
//! # Overview
//!
//! The main error type [`StrataError`] covers every failure the core can
//! report. None of them are transient: they are all programmer/usage errors
//! that the calling code is expected to prevent, so nothing in the core
//! retries or swallows them.
//!
//! - Scene invariant violations (self-parenting, cross-scene parenting, cycles)
//! - Resource errors (not loaded yet, wrong type, failed load)
//! - Device and view errors (disposed device, view bound to another scene)
//! - Configuration errors
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, StrataError>`.
//!
//! ```rust,ignore
//! use strata::errors::{StrataError, Result};
//!
//! fn attach(scene: &mut Scene, parent: NodeHandle, child: NodeHandle) -> Result<()> {
//!     scene.add_child(parent, child)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::core::device::DeviceIndex;
use crate::resources::ResourceKey;
use crate::scene::{LayerId, NodeHandle, SceneId, ViewId};

/// The main error type for the engine core.
#[derive(Error, Debug)]
pub enum StrataError {
    // ========================================================================
    // Scene Invariant Violations
    // ========================================================================
    /// A node was asked to become its own parent.
    #[error("Node {0:?} cannot be its own parent")]
    SelfParenting(NodeHandle),

    /// Parent and child live in different scenes.
    #[error("Cannot parent node {child:?} (scene {child_scene:?}) to a node of scene {parent_scene:?}")]
    CrossSceneParenting {
        /// The child that was to be attached
        child: NodeHandle,
        /// Scene of the child
        child_scene: SceneId,
        /// Scene of the parent candidate
        parent_scene: SceneId,
    },

    /// Parent and child are attached to different layers of the same scene.
    #[error("Node {child:?} is on layer {child_layer:?} but its parent is on layer {parent_layer:?}")]
    LayerMismatch {
        /// The child that was to be attached
        child: NodeHandle,
        /// Layer of the child
        child_layer: LayerId,
        /// Layer of the parent candidate
        parent_layer: LayerId,
    },

    /// The child is already in the parent's child list.
    #[error("Node {child:?} is already a child of {parent:?}")]
    DuplicateChild {
        /// Parent node
        parent: NodeHandle,
        /// Child node
        child: NodeHandle,
    },

    /// The child already has another parent and must be removed first.
    #[error("Node {child:?} already has parent {current_parent:?}")]
    AlreadyParented {
        /// Child node
        child: NodeHandle,
        /// Its current parent
        current_parent: NodeHandle,
    },

    /// Attaching would make a node its own ancestor.
    #[error("Attaching {child:?} below {parent:?} would create a cycle")]
    CycleDetected {
        /// Parent candidate
        parent: NodeHandle,
        /// Child candidate (an ancestor of `parent`)
        child: NodeHandle,
    },

    /// `remove_child` was called with a node that is not a child of `parent`.
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent node
        parent: NodeHandle,
        /// Node that was expected to be a child
        child: NodeHandle,
    },

    /// The handle does not point to a live node of this scene.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// The layer does not exist in this scene.
    #[error("Layer not found: {0:?}")]
    LayerNotFound(LayerId),

    /// A layer with this name already exists.
    #[error("Layer name already in use: {0}")]
    DuplicateLayer(String),

    /// A layer still holds nodes and cannot be removed.
    #[error("Layer {0:?} still contains nodes")]
    LayerNotEmpty(LayerId),

    /// A spatial operation was called on a node that carries no transform.
    #[error("Node {0:?} is not a spatial node")]
    NotSpatial(NodeHandle),

    /// The scene handle is not known to the engine.
    #[error("Scene not found: {0:?}")]
    SceneNotFound(SceneId),

    // ========================================================================
    // View Errors
    // ========================================================================
    /// A view token was used with a scene it is not bound to.
    #[error("View {view:?} is bound to scene {view_scene:?}, not to scene {scene:?}")]
    ViewNotBound {
        /// The offending view
        view: ViewId,
        /// The scene the view actually belongs to
        view_scene: SceneId,
        /// The scene the call was made on
        scene: SceneId,
    },

    /// The view belongs to this scene but was never registered (or was removed).
    #[error("View {0:?} is not registered")]
    ViewNotRegistered(ViewId),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The device index was never attached, or its device has been disposed.
    #[error("Device {0:?} is not attached")]
    DeviceUnavailable(DeviceIndex),

    /// The registry has no free device slot left.
    #[error("Device limit reached ({0} devices)")]
    DeviceLimitReached(usize),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A device-scoped resource was requested before it was loaded (or after
    /// it was unloaded) for that device.
    #[error("Resource {key:?} is not loaded on device {device:?}")]
    ResourceNotReady {
        /// Logical resource key
        key: ResourceKey,
        /// Device index the lookup was made for
        device: DeviceIndex,
    },

    /// A resource exists under the key but with a different concrete type.
    #[error("Resource {key:?} has a different type than {expected}")]
    ResourceTypeMismatch {
        /// Logical resource key
        key: ResourceKey,
        /// Requested type name
        expected: &'static str,
    },

    /// A concrete resource failed to create its device objects.
    #[error("Failed to load resource {key:?} on device {device:?}: {reason}")]
    ResourceLoadFailed {
        /// Logical resource key
        key: ResourceKey,
        /// Device index the load was attempted on
        device: DeviceIndex,
        /// Failure description from the resource
        reason: String,
    },

    // ========================================================================
    // Request & Capture Errors
    // ========================================================================
    /// The view has no capture surface attached.
    #[error("View {0:?} has no capture surface")]
    CaptureUnavailable(ViewId),

    /// The engine dropped a pending request before answering it.
    #[error("Request was dropped before completion")]
    RequestDropped,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
