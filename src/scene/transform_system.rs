//! Update traversal
//!
//! Walks the scene graph depth-first, layer by layer, and runs for every
//! node:
//!
//! 1. resource loading for every active device the content is missing on
//! 2. the animation driver
//! 3. the spatial pipeline (hosted object pull, world matrix, shader
//!    parameter invalidation)
//! 4. the children, with the node's world matrix pushed and the force flag
//!    raised if the world matrix was recomputed
//!
//! Kept apart from [`Scene`](super::Scene) so that it only borrows the node
//! arena and the resource dictionary, which are disjoint fields.

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::resources::ResourceDictionary;
use crate::scene::drawable::LoadContext;
use crate::scene::node::Node;
use crate::scene::spatial::Transformable;
use crate::scene::state::UpdateState;
use crate::scene::{NodeKey, SceneId};

pub(crate) fn update_hierarchy(
    scene: SceneId,
    nodes: &mut SlotMap<NodeKey, Node>,
    roots: &[NodeKey],
    resources: &mut ResourceDictionary,
    state: &mut UpdateState<'_>,
) -> Result<()> {
    for &root in roots {
        update_node(scene, nodes, root, resources, state)?;
    }
    Ok(())
}

fn update_node(
    scene: SceneId,
    nodes: &mut SlotMap<NodeKey, Node>,
    key: NodeKey,
    resources: &mut ResourceDictionary,
    state: &mut UpdateState<'_>,
) -> Result<()> {
    // The delegated source is read before borrowing this node mutably. Its
    // world matrix is whatever it holds at this point of the traversal.
    let source_world = nodes
        .get(key)
        .and_then(|node| node.spatial())
        .and_then(|spatial| spatial.transform_mode().source())
        .and_then(|source| {
            if source.scene() != scene {
                log::warn!("Transform source {source:?} belongs to another scene, using identity");
                return None;
            }
            nodes.get(source.key()).and_then(Node::world_matrix)
        });

    let Some(node) = nodes.get_mut(key) else {
        return Ok(());
    };

    // 1. Device resources
    if let Some(content) = node.content.as_mut() {
        for device in state.active_devices() {
            if !content.is_loaded(device.index()) {
                content.load_resources(&mut LoadContext {
                    device,
                    resources: &mut *resources,
                })?;
            }
        }
    }
    if let Some(spatial) = node.spatial.as_mut() {
        for device in state.active_devices() {
            spatial.ensure_device(device.index());
        }
    }

    // 2. Animation
    if let Some(driver) = node.animation.as_mut() {
        let target = node.spatial.as_mut().map(|spatial| spatial as &mut dyn Transformable);
        driver.advance(state.time(), target);
        if driver.is_finished() {
            node.animation = None;
        }
    }

    // 3. Spatial pipeline
    let is_static = node.is_static;
    let recomputed = match node.spatial.as_mut() {
        Some(spatial) => spatial.update(state, is_static, source_world),
        None => false,
    };

    if node.children.is_empty() {
        return Ok(());
    }

    // 4. Children
    let world = node.world_matrix();
    let children: SmallVec<[NodeKey; 8]> = node.children.iter().copied().collect();

    let previous = state.force_transform_update();
    state.replace_force_flag(previous || recomputed);
    if let Some(world) = world {
        state.matrices.push(world);
    }

    let result = children
        .iter()
        .try_for_each(|&child| update_node(scene, nodes, child, resources, state));

    if world.is_some() {
        state.matrices.pop();
    }
    state.replace_force_flag(previous);
    result
}
