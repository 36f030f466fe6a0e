use crate::scene::{NodeHandle, Scene};

/// Replaces every material under `root` with its unlit counterpart.
///
/// Covers meshes with one or several materials. Returns how many
/// materials were replaced.
pub fn convert_to_unlit(scene: &mut Scene, root: NodeHandle) -> usize {
    let mut mesh_keys = Vec::new();
    scene.traverse(root, |_, node| {
        if let Some(key) = node.mesh {
            mesh_keys.push(key);
        }
    });

    let mut replaced = 0;
    for key in mesh_keys {
        let Some(mesh) = scene.meshes.get_mut(key) else {
            continue;
        };
        for material in mesh.materials_mut() {
            *material = material.to_unlit();
            replaced += 1;
        }
    }

    log::debug!("Converted {replaced} materials to unlit");
    replaced
}
