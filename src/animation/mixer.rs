use std::sync::Arc;

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binder::Binder;
use crate::animation::binding::TargetPath;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

/// Plays clips on the subtree of one root node.
pub struct AnimationMixer {
    root: NodeHandle,
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Binds `clip` against the mixer root and returns its (stopped) action.
    ///
    /// Asking again for a clip already known returns the existing action.
    pub fn clip_action(&mut self, scene: &Scene, clip: Arc<AnimationClip>) -> &mut AnimationAction {
        if let Some(pos) = self.actions.iter().position(|a| Arc::ptr_eq(a.clip(), &clip)) {
            return &mut self.actions[pos];
        }

        let bindings = Binder::bind(scene, self.root, &clip);
        let mut action = AnimationAction::new(clip);
        action.bindings = bindings;
        self.actions.push(action);

        let last = self.actions.len() - 1;
        &mut self.actions[last]
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Advances every action and writes the sampled values to the scene.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);
        }

        for action in &mut self.actions {
            if !action.enabled || action.weight <= 0.0 {
                continue;
            }

            for i in 0..action.bindings.len() {
                let (track_index, node_handle, target) = {
                    let b = &action.bindings[i];
                    (b.track_index, b.node_handle, b.target)
                };
                let Some(value) = action.sample_track(track_index) else {
                    continue;
                };
                apply_value(scene, node_handle, target, value);
            }
        }
    }
}

fn apply_value(scene: &mut Scene, node_handle: NodeHandle, target: TargetPath, value: TrackValue) {
    match (value, target) {
        (TrackValue::Vector3(v), TargetPath::Translation) => {
            if let Some(node) = scene.get_node_mut(node_handle) {
                node.transform.position = v;
            }
        }
        (TrackValue::Vector3(v), TargetPath::Scale) => {
            if let Some(node) = scene.get_node_mut(node_handle) {
                node.transform.scale = v;
            }
        }
        (TrackValue::Quaternion(q), TargetPath::Rotation) => {
            if let Some(node) = scene.get_node_mut(node_handle) {
                node.transform.rotation = q;
            }
        }
        (TrackValue::MorphWeights(w), TargetPath::Weights) => {
            let mesh_key = scene.get_node(node_handle).and_then(|n| n.mesh);
            if let Some(mesh) = mesh_key.and_then(|key| scene.meshes.get_mut(key)) {
                mesh.morph_weights.clear();
                mesh.morph_weights.extend_from_slice(&w.weights);
            }
        }
        _ => {}
    }
}
