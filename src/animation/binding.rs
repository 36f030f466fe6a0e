use crate::scene::NodeHandle;

/// Node property a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetPath {
    Translation, // Maps to transform.position
    Rotation,    // Maps to transform.rotation
    Scale,       // Maps to transform.scale
    Weights,     // Maps to the node mesh's morph weights
}

/// Track `track_index` of a clip resolved to a node of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}
