use crate::scene::{LayerId, NodeKey};

/// Name of the layer every scene starts with.
pub const DEFAULT_LAYER_NAME: &str = "Default";

/// A named, ordered partition of a scene's root nodes.
///
/// Layers are rendered in ascending `order`; ties keep creation order.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    order: i32,
    pub(crate) roots: Vec<NodeKey>,
    pub(crate) node_count: usize,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String, order: i32) -> Self {
        Self {
            id,
            name,
            order,
            roots: Vec::new(),
            node_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    #[inline]
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Nodes attached to this layer, roots and descendants.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }
}
