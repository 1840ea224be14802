use glam::Vec3;

use crate::scene::{LayerId, NodeHandle};

/// How a pick query tests candidate nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PickOptions {
    /// Test bounding boxes only, skipping exact content tests.
    pub bounding_box_only: bool,
    /// Restrict the query to one layer.
    pub layer: Option<LayerId>,
    /// Ignore hits farther than this along the ray.
    pub max_distance: Option<f32>,
}

/// Nearest hit of a pick query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub node: NodeHandle,
    /// Distance from the ray origin (the near plane) in world units.
    pub distance: f32,
    pub point: Vec3,
}
