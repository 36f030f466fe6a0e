//! Transform system
//!
//! Propagates local matrices into world matrices down the hierarchy. Kept
//! apart from [`Scene`] so it only borrows the node and camera maps.
//!
//! [`Scene`]: crate::scene::Scene

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::{CameraKey, NodeHandle};

/// Updates world matrices for every tree under `roots`.
///
/// Uses an explicit stack, so deep skeletons cannot overflow the call
/// stack. Parents are always visited before their children.
pub fn update_hierarchy_iterative(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    roots: &[NodeHandle],
) {
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    run_stack(nodes, cameras, &mut stack);
}

/// Updates the subtree rooted at `root_handle`, forcing a world matrix
/// refresh even if its local matrix is unchanged.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    root_handle: NodeHandle,
) {
    let Some(node) = nodes.get(root_handle) else {
        return;
    };
    let parent_world = node
        .parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    let mut stack = vec![(root_handle, parent_world, true)];
    run_stack(nodes, cameras, &mut stack);
}

fn run_stack(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    stack: &mut Vec<(NodeHandle, Affine3A, bool)>,
) {
    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera) = node.camera.and_then(|key| cameras.get_mut(key)) {
                camera.update_view_projection(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}
