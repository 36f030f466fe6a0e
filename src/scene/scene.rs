use glam::Vec3;
use slotmap::SlotMap;

use crate::assets::prefab::ModelPrefab;
use crate::resources::geometry::BoundingBox;
use crate::resources::mesh::Mesh;
use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::skeleton::{Skeleton, SkinBinding};
use crate::scene::transform_system;
use crate::scene::{CameraKey, MeshKey, NodeHandle, SkeletonKey};

/// Scene graph.
///
/// Pure data: the node tree plus component maps. Nothing here talks to a
/// drawing surface; the surface reads the scene after
/// [`Scene::update_matrix_world`] and [`Scene::update_skeletons`].
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Components ====
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub cameras: SlotMap<CameraKey, Camera>,
    pub skins: SlotMap<SkeletonKey, Skeleton>,

    pub active_camera: Option<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            skins: SlotMap::with_key(),
            active_camera: None,
        }
    }

    /// Adds a node at the top level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::warn!("Parent node not found, adding '{}' at the top level", child.name);
            return self.add_node(child);
        }

        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Re-parents `child` under `parent`.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            log::error!("Node not found during attach!");
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Cannot attach a node below its own descendant!");
            return;
        }

        // 1. Detach from old
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Whether `ancestor` lies on the parent chain of `node` (or is `node`).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Depth-first, pre-order search for a node called `name` in the
    /// subtree of `root`, `root` included.
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if node.name == name {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Visits `root` and its descendants in pre-order.
    pub fn traverse<F>(&self, root: NodeHandle, mut visit: F)
    where
        F: FnMut(NodeHandle, &Node),
    {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            visit(handle, node);
            stack.extend(node.children.iter().rev());
        }
    }

    /// Whether the node and all of its ancestors are visible.
    #[must_use]
    pub fn is_visible_in_hierarchy(&self, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            match self.nodes.get(h) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    // ========================================================================
    // Component API
    // ========================================================================

    pub fn add_mesh_to_parent(&mut self, mesh: Mesh, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_to_parent(node, parent)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let mut node = Node::new(&camera.name);
        node.camera = Some(self.cameras.insert(camera));
        self.add_node(node)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skins.insert(skeleton)
    }

    pub fn main_camera(&self) -> Option<&Camera> {
        let key = self.get_node(self.active_camera?)?.camera?;
        self.cameras.get(key)
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        let key = self.get_node(self.active_camera?)?.camera?;
        self.cameras.get_mut(key)
    }

    /// Whether any mesh in the subtree is bound to a skeleton.
    #[must_use]
    pub fn has_skeleton(&self, root: NodeHandle) -> bool {
        let mut found = false;
        self.traverse(root, |_, node| found |= node.skin.is_some());
        found
    }

    // ========================================================================
    // Matrix pipeline
    // ========================================================================

    /// Propagates transforms to world matrices for the whole scene.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(
            &mut self.nodes,
            &mut self.cameras,
            &self.root_nodes,
        );
    }

    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, root);
    }

    /// Recomputes joint matrices for every skinned node.
    pub fn update_skeletons(&mut self) {
        let mut tasks = Vec::new();

        for (_, node) in &self.nodes {
            if let Some(binding) = &node.skin {
                tasks.push((binding.skeleton, node.transform.world_matrix.inverse()));
            }
        }

        let nodes = &self.nodes;
        for (skeleton_id, root_inv) in tasks {
            if let Some(skeleton) = self.skins.get_mut(skeleton_id) {
                skeleton.compute_joint_matrices(nodes, root_inv);
            }
        }
    }

    /// World-space bounds of every mesh in the subtree, from the last
    /// world matrix update.
    #[must_use]
    pub fn compute_bounds(&self, root: NodeHandle) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        self.traverse(root, |_, node| {
            let Some(mesh) = node.mesh.and_then(|key| self.meshes.get(key)) else {
                return;
            };
            for primitive in &mesh.primitives {
                if let Some(local) = primitive.geometry.bounding_box() {
                    let world = local.transform(&node.transform.world_matrix);
                    bounds = Some(bounds.map_or(world, |b| b.union(&world)));
                }
            }
        });
        bounds
    }

    // ========================================================================
    // Prefab instantiation
    // ========================================================================

    /// Creates scene nodes for `prefab` under `parent` and returns the new
    /// model root.
    ///
    /// A prefab with a single top-level node uses that node as the root;
    /// otherwise a group node named after the prefab wraps them.
    pub fn instantiate(&mut self, prefab: &ModelPrefab, parent: NodeHandle) -> NodeHandle {
        let single_root = (prefab.root_indices.len() == 1).then(|| prefab.root_indices[0]);

        let top = match single_root {
            Some(_) => parent,
            None => self.add_to_parent(Node::new(&prefab.name), parent),
        };

        // Pass 1: nodes, detached
        let handles: Vec<NodeHandle> = prefab
            .nodes
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut node = Node::new(p.name.as_deref().unwrap_or(""));
                node.transform = p.transform.clone();
                node.transform.mark_dirty();
                if node.name.is_empty() {
                    node.name = format!("node_{i}");
                }
                node.mesh = p.mesh.clone().map(|m| self.meshes.insert(m));
                self.nodes.insert(node)
            })
            .collect();

        // Pass 2: hierarchy
        for (i, p) in prefab.nodes.iter().enumerate() {
            for &child in &p.children_indices {
                if let Some(&child_handle) = handles.get(child) {
                    self.link(child_handle, handles[i]);
                }
            }
        }
        for &idx in &prefab.root_indices {
            if let Some(&h) = handles.get(idx) {
                self.link(h, top);
            }
        }

        // Pass 3: skins
        let skeleton_keys: Vec<SkeletonKey> = prefab
            .skeletons
            .iter()
            .map(|s| {
                let bones = s
                    .bone_indices
                    .iter()
                    .filter_map(|&i| handles.get(i).copied())
                    .collect();
                self.add_skeleton(Skeleton::new(&s.name, bones, s.inverse_bind_matrices.clone()))
            })
            .collect();

        for (i, p) in prefab.nodes.iter().enumerate() {
            if let Some(&key) = p.skin_index.and_then(|s| skeleton_keys.get(s))
                && let Some(node) = self.nodes.get_mut(handles[i])
            {
                node.skin = Some(SkinBinding::attached(key));
            }
        }

        single_root
            .and_then(|idx| handles.get(idx).copied())
            .unwrap_or(top)
    }

    fn link(&mut self, child: NodeHandle, parent: NodeHandle) {
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
    }

    /// Sets the uniform scale and position of a node in one go.
    pub fn set_placement(&mut self, handle: NodeHandle, position: Vec3, scale: f32) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.position = position;
            node.transform.scale = Vec3::splat(scale);
        }
    }
}
