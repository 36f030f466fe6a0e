//! Scene Graph Tests
//!
//! Tests for:
//! - Hierarchy building, re-parenting and cycle refusal
//! - Name lookup and traversal order
//! - World matrix propagation and visibility
//! - Prefab instantiation (single and multiple roots, skins)
//! - Camera projection calibration

use std::sync::Arc;

use glam::{Affine3A, Mat4, Quat, Vec3, Vec4};
use smallvec::smallvec;

use marker_avatar::assets::{ModelPrefab, PrefabNode, PrefabSkeleton};
use marker_avatar::resources::{Geometry, Material, Mesh, Primitive};
use marker_avatar::scene::{Camera, Node, Scene, Transform};

const EPSILON: f32 = 1e-5;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn prefab_node(name: &str, position: Vec3, children: Vec<usize>) -> PrefabNode {
    let mut transform = Transform::new();
    transform.position = position;
    PrefabNode {
        name: Some(name.to_string()),
        transform,
        children_indices: children,
        ..PrefabNode::default()
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn add_to_parent_links_both_ways() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);

    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
    assert_eq!(scene.get_node(parent).unwrap().children(), &[child]);
    assert_eq!(scene.root_nodes, vec![parent]);
}

#[test]
fn attach_moves_between_parents() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_node(Node::new("b"));
    let c = scene.add_to_parent(Node::new("c"), a);

    scene.attach(c, b);

    assert!(scene.get_node(a).unwrap().children().is_empty());
    assert_eq!(scene.get_node(b).unwrap().children(), &[c]);
    assert_eq!(scene.get_node(c).unwrap().parent(), Some(b));
}

#[test]
fn attach_refuses_cycles() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_to_parent(Node::new("b"), a);
    let c = scene.add_to_parent(Node::new("c"), b);

    scene.attach(a, c);
    scene.attach(b, b);

    assert_eq!(scene.get_node(a).unwrap().parent(), None);
    assert_eq!(scene.get_node(b).unwrap().parent(), Some(a));
    assert_eq!(scene.root_nodes, vec![a]);
}

#[test]
fn find_node_by_name_searches_subtree() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("root"));
    let arm = scene.add_to_parent(Node::new("arm"), root);
    let hand = scene.add_to_parent(Node::new("hand"), arm);
    let other = scene.add_node(Node::new("other"));

    assert_eq!(scene.find_node_by_name(root, "hand"), Some(hand));
    assert_eq!(scene.find_node_by_name(root, "root"), Some(root));
    assert_eq!(scene.find_node_by_name(other, "hand"), None);
}

#[test]
fn traverse_is_pre_order() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("root"));
    let a = scene.add_to_parent(Node::new("a"), root);
    scene.add_to_parent(Node::new("a1"), a);
    scene.add_to_parent(Node::new("b"), root);

    let mut names = Vec::new();
    scene.traverse(root, |_, node| names.push(node.name.clone()));
    assert_eq!(names, vec!["root", "a", "a1", "b"]);
}

// ============================================================================
// World matrices & visibility
// ============================================================================

#[test]
fn world_matrix_composes_parent_transforms() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);

    {
        let p = scene.get_node_mut(parent).unwrap();
        p.transform.position = Vec3::new(1.0, 0.0, 0.0);
        p.transform.scale = Vec3::splat(2.0);
    }
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 1.0, 0.0);

    scene.update_matrix_world();

    let world = scene.get_node(child).unwrap().world_matrix();
    assert!(approx_vec(world.translation.into(), Vec3::new(1.0, 2.0, 0.0)));
}

#[test]
fn world_matrix_follows_later_changes() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);
    scene.update_matrix_world();

    scene.get_node_mut(parent).unwrap().transform.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    scene.get_node_mut(child).unwrap().transform.position = Vec3::X;
    scene.update_matrix_world();

    let world = scene.get_node(child).unwrap().world_matrix();
    assert!(approx_vec(world.translation.into(), Vec3::Y));
}

#[test]
fn apply_local_matrix_decomposes_pose() {
    let mut transform = Transform::new();
    let pose = Mat4::from_scale_rotation_translation(
        Vec3::splat(0.5),
        Quat::from_rotation_y(0.3),
        Vec3::new(0.0, 0.0, -2.0),
    );
    transform.apply_local_matrix_from_mat4(pose);

    assert!(approx_vec(transform.position, Vec3::new(0.0, 0.0, -2.0)));
    assert!(approx_vec(transform.scale, Vec3::splat(0.5)));
    assert!(transform.rotation.angle_between(Quat::from_rotation_y(0.3)) < 1e-4);
}

#[test]
fn hidden_ancestor_hides_descendants() {
    let mut scene = Scene::new();
    let marker = scene.add_node(Node::new("marker"));
    let avatar = scene.add_to_parent(Node::new("avatar"), marker);
    assert!(scene.is_visible_in_hierarchy(avatar));

    scene.get_node_mut(marker).unwrap().visible = false;
    assert!(!scene.is_visible_in_hierarchy(avatar));
}

// ============================================================================
// Prefab instantiation
// ============================================================================

#[test]
fn instantiate_single_root_uses_that_node() {
    let mut prefab = ModelPrefab::new("avatar");
    prefab.nodes = vec![
        prefab_node("Root", Vec3::ZERO, vec![1]),
        prefab_node("J_Bip_C_Hips", Vec3::Y, vec![]),
    ];
    prefab.root_indices = vec![0];

    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let root = scene.instantiate(&prefab, parent);

    assert_eq!(scene.get_node(root).unwrap().name, "Root");
    assert_eq!(scene.get_node(root).unwrap().parent(), Some(parent));
    let hips = scene.find_node_by_name(parent, "J_Bip_C_Hips").unwrap();
    assert_eq!(scene.get_node(hips).unwrap().parent(), Some(root));
}

#[test]
fn instantiate_multiple_roots_adds_group() {
    let mut prefab = ModelPrefab::new("pair");
    prefab.nodes = vec![
        prefab_node("left", Vec3::NEG_X, vec![]),
        prefab_node("right", Vec3::X, vec![]),
    ];
    prefab.root_indices = vec![0, 1];

    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let root = scene.instantiate(&prefab, parent);

    let group = scene.get_node(root).unwrap();
    assert_eq!(group.name, "pair");
    assert_eq!(group.children().len(), 2);
}

#[test]
fn instantiate_names_unnamed_nodes_and_copies_meshes() {
    let mut prefab = ModelPrefab::new("m");
    let primitives = smallvec![
        Primitive {
            geometry: Arc::new(Geometry::new()),
            material: Material::new_standard(Vec4::ONE),
        },
        Primitive {
            geometry: Arc::new(Geometry::new()),
            material: Material::new_standard(Vec4::ONE),
        },
    ];
    prefab.nodes = vec![PrefabNode {
        mesh: Some(Mesh::from_primitives("Body", primitives)),
        ..PrefabNode::default()
    }];
    prefab.root_indices = vec![0];

    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let root = scene.instantiate(&prefab, parent);

    let node = scene.get_node(root).unwrap();
    assert_eq!(node.name, "node_0");
    let mesh = &scene.meshes[node.mesh.unwrap()];
    assert_eq!(mesh.name, "Body");
    assert!(mesh.is_multi_material());
}

#[test]
fn instantiate_binds_skins_and_computes_joints() {
    let mut prefab = ModelPrefab::new("skinned");
    let mut body = prefab_node("Body", Vec3::ZERO, vec![]);
    body.skin_index = Some(0);
    prefab.nodes = vec![
        prefab_node("Root", Vec3::ZERO, vec![1, 2]),
        prefab_node("Bone", Vec3::new(0.0, 1.0, 0.0), vec![]),
        body,
    ];
    prefab.root_indices = vec![0];
    prefab.skeletons = vec![PrefabSkeleton {
        name: "skin_0".to_string(),
        bone_indices: vec![1],
        inverse_bind_matrices: vec![Affine3A::from_translation(Vec3::new(0.0, -1.0, 0.0))],
    }];

    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let root = scene.instantiate(&prefab, parent);
    assert!(scene.has_skeleton(root));

    scene.update_matrix_world();
    scene.update_skeletons();

    let body = scene.find_node_by_name(root, "Body").unwrap();
    let key = scene.get_node(body).unwrap().skin.as_ref().unwrap().skeleton;
    let joints = scene.skins[key].joint_matrices();
    assert_eq!(joints.len(), 1);
    assert!(joints[0].abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
fn set_placement_sets_uniform_scale() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("avatar"));
    scene.set_placement(node, Vec3::new(0.0, 0.0, 0.5), 1.5);

    let t = &scene.get_node(node).unwrap().transform;
    assert!(approx_vec(t.position, Vec3::new(0.0, 0.0, 0.5)));
    assert!(approx_vec(t.scale, Vec3::splat(1.5)));
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn calibrated_projection_survives_aspect_change() {
    let mut camera = Camera::new_perspective(45.0, 1.0, 0.1, 100.0);
    let calibration = Mat4::from_cols_array(&[
        2.0, 0.0, 0.0, 0.0, //
        0.0, 2.5, 0.0, 0.0, //
        0.0, 0.0, -1.0, -1.0, //
        0.0, 0.0, -0.2, 0.0,
    ]);
    camera.set_projection_matrix(calibration);
    camera.set_aspect(2.0);

    assert!(camera.is_calibrated());
    assert_eq!(*camera.projection_matrix(), calibration);
}

#[test]
fn uncalibrated_projection_tracks_aspect() {
    let mut camera = Camera::new_perspective(45.0, 1.0, 0.1, 100.0);
    camera.set_aspect(2.0);
    let expected = Mat4::perspective_rh(45f32.to_radians(), 2.0, 0.1, 100.0);
    assert!(camera.projection_matrix().abs_diff_eq(expected, EPSILON));
}

#[test]
fn active_camera_is_reachable() {
    let mut scene = Scene::new();
    assert!(scene.main_camera().is_none());
    let cam = scene.add_camera(Camera::new_perspective(45.0, 1.0, 0.1, 100.0));
    scene.active_camera = Some(cam);
    assert!(scene.main_camera().is_some());
}
