use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves each track of `clip` to a node inside the subtree of
    /// `root_node`, matching by name. Tracks whose node does not exist are
    /// skipped.
    #[must_use]
    pub fn bind(scene: &Scene, root_node: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            if let Some(node_handle) = scene.find_node_by_name(root_node, &track.meta.node_name) {
                bindings.push(PropertyBinding {
                    track_index,
                    node_handle,
                    target: track.meta.target,
                });
            } else {
                log::trace!("No node '{}' for track {track_index}", track.meta.node_name);
            }
        }

        bindings
    }
}
