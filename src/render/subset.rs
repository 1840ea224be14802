//! Per-(view, layer) pass subscriptions.
//!
//! A [`RenderPassSubset`] answers "what does this view draw in this layer,
//! pass by pass". Each pass keeps a dense list of subscriptions so that
//! rendering walks contiguous memory; a reverse index per node makes
//! unsubscribing a node proportional to its own subscription count.

use rustc_hash::FxHashMap;
use slotmap::{DenseSlotMap, new_key_type};
use smallvec::SmallVec;

use crate::render::context::DrawCallback;
use crate::render::pass::PassId;
use crate::scene::view::ViewId;
use crate::scene::{LayerId, NodeHandle};

new_key_type! {
    struct SubscriptionKey;
}

struct Subscription {
    node: NodeHandle,
    callback: DrawCallback,
}

pub struct RenderPassSubset {
    view: ViewId,
    layer: LayerId,
    passes: FxHashMap<PassId, DenseSlotMap<SubscriptionKey, Subscription>>,
    by_node: FxHashMap<NodeHandle, SmallVec<[(PassId, SubscriptionKey); 2]>>,
}

impl RenderPassSubset {
    #[must_use]
    pub fn new(view: ViewId, layer: LayerId) -> Self {
        Self {
            view,
            layer,
            passes: FxHashMap::default(),
            by_node: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.view
    }

    #[inline]
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Adds a subscription of `node` to `pass`. A node may hold several
    /// subscriptions, also to the same pass.
    pub fn subscribe(&mut self, node: NodeHandle, pass: PassId, callback: DrawCallback) {
        let key = self
            .passes
            .entry(pass)
            .or_default()
            .insert(Subscription { node, callback });
        self.by_node.entry(node).or_default().push((pass, key));
    }

    /// Drops every subscription of `node`. Returns how many were dropped.
    pub fn unsubscribe_all(&mut self, node: NodeHandle) -> usize {
        let Some(entries) = self.by_node.remove(&node) else {
            return 0;
        };
        for (pass, key) in &entries {
            if let Some(list) = self.passes.get_mut(pass) {
                list.remove(*key);
            }
        }
        entries.len()
    }

    #[must_use]
    pub fn count_subscriptions(&self, node: NodeHandle) -> usize {
        self.by_node.get(&node).map_or(0, SmallVec::len)
    }

    /// Passes `node` is subscribed to, one entry per subscription.
    pub fn passes_of(&self, node: NodeHandle) -> impl Iterator<Item = PassId> + '_ {
        self.by_node
            .get(&node)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(pass, _)| *pass))
    }

    #[must_use]
    pub fn count_pass(&self, pass: PassId) -> usize {
        self.passes.get(&pass).map_or(0, DenseSlotMap::len)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.passes.values().map(DenseSlotMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    /// Subscriptions of one pass.
    pub fn iter_pass(&self, pass: PassId) -> impl Iterator<Item = (NodeHandle, &DrawCallback)> + '_ {
        self.passes
            .get(&pass)
            .into_iter()
            .flat_map(|list| list.values().map(|sub| (sub.node, &sub.callback)))
    }

    pub fn clear(&mut self) {
        self.passes.clear();
        self.by_node.clear();
    }
}

impl std::fmt::Debug for RenderPassSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPassSubset")
            .field("view", &self.view)
            .field("layer", &self.layer)
            .field("nodes", &self.by_node.len())
            .field("subscriptions", &self.total())
            .finish()
    }
}

/// Write-only handle given to [`PassSubscriber`](crate::scene::PassSubscriber)s,
/// bound to one node of one subset.
pub struct PassSubscriptionSink<'a> {
    subset: &'a mut RenderPassSubset,
    node: NodeHandle,
    added: usize,
}

impl<'a> PassSubscriptionSink<'a> {
    pub(crate) fn new(subset: &'a mut RenderPassSubset, node: NodeHandle) -> Self {
        Self { subset, node, added: 0 }
    }

    pub fn subscribe(&mut self, pass: PassId, callback: DrawCallback) {
        self.subset.subscribe(self.node, pass, callback);
        self.added += 1;
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.subset.view()
    }

    #[inline]
    #[must_use]
    pub fn added(&self) -> usize {
        self.added
    }
}
