//! Per-view visibility filters.
//!
//! Filters run during the visibility pass after the detail-level check.
//! A node is visible in a view only if every filter of the view accepts it.

use crate::scene::node::Node;
use crate::scene::view::ViewInformation;

pub trait VisibilityFilter: Send + Sync {
    fn is_visible(&self, node: &Node, view: &ViewInformation) -> bool;
}

/// Rejects content whose world bounds lie outside the camera frustum.
///
/// Nodes without bounds always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrustumFilter;

impl VisibilityFilter for FrustumFilter {
    fn is_visible(&self, node: &Node, view: &ViewInformation) -> bool {
        match node.world_bounds() {
            Some(bounds) => view.camera.frustum().intersects_box(&bounds),
            None => true,
        }
    }
}

/// Rejects spatial nodes farther from the camera than `max_distance`.
#[derive(Debug, Clone, Copy)]
pub struct DistanceFilter {
    pub max_distance: f32,
}

impl DistanceFilter {
    #[must_use]
    pub fn new(max_distance: f32) -> Self {
        Self { max_distance }
    }
}

impl VisibilityFilter for DistanceFilter {
    fn is_visible(&self, node: &Node, view: &ViewInformation) -> bool {
        let Some(spatial) = node.spatial() else {
            return true;
        };
        let point = match node.world_bounds() {
            Some(bounds) => bounds.center(),
            None => spatial.world_position(),
        };
        point.distance(view.camera.position()) <= self.max_distance
    }
}
