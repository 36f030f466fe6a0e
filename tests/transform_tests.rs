//! Transform, bounds and frame timing tests
//!
//! Tests for:
//! - Transform TRS operations and dirty checking
//! - Euler angle round-trip conversions
//! - Subtree matrix propagation
//! - BoundingBox helpers and scene bounds
//! - FpsCounter and Timer

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3, Vec4};

use marker_avatar::resources::{BoundingBox, Geometry, Material, Mesh};
use marker_avatar::scene::{Node, Scene, Transform};
use marker_avatar::utils::{FpsCounter, Timer};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// ============================================================================
// Transform Unit Tests
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_update_local_matrix_dirty_check() {
    let mut t = Transform::new();

    // First call always updates
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.position = Vec3::new(1.0, 2.0, 3.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.rotation = Quat::from_rotation_y(FRAC_PI_2);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.scale = Vec3::splat(2.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());
}

#[test]
fn transform_local_matrix_reflects_trs() {
    let mut t = Transform::new();
    t.position = Vec3::new(1.0, 0.0, 0.0);
    t.scale = Vec3::splat(2.0);
    t.update_local_matrix();

    let p = t.local_matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
    assert!(vec3_approx(p, Vec3::new(3.0, 2.0, 2.0)));
}

#[test]
fn transform_euler_roundtrip() {
    let mut t = Transform::new();
    t.set_rotation_euler(0.3, -0.7, 1.1);
    let e = t.rotation_euler();
    assert!((e - Vec3::new(0.3, -0.7, 1.1)).length() < 1e-4, "got {e}");
}

#[test]
fn transform_mark_dirty_forces_update() {
    let mut t = Transform::new();
    t.update_local_matrix();
    t.mark_dirty();
    assert!(t.update_local_matrix());
}

#[test]
fn transform_apply_local_matrix_decomposes() {
    let mut t = Transform::new();
    t.apply_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 0.0, -1.0)));

    assert!(vec3_approx(t.position, Vec3::new(0.0, 0.0, -1.0)));
    // Shadow state already matches, so only the forced refresh remains
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());
}

// ============================================================================
// Hierarchy propagation
// ============================================================================

#[test]
fn subtree_update_uses_parent_world() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("root"));
    let child = scene.add_to_parent(Node::new("child"), root);
    let leaf = scene.add_to_parent(Node::new("leaf"), child);

    scene.get_node_mut(root).unwrap().transform.position = Vec3::X;
    scene.update_matrix_world();

    scene.get_node_mut(child).unwrap().transform.position = Vec3::Y;
    scene.get_node_mut(leaf).unwrap().transform.position = Vec3::Z;
    scene.update_subtree(child);

    let world = scene.get_node(leaf).unwrap().world_matrix();
    assert!(vec3_approx(world.translation.into(), Vec3::new(1.0, 1.0, 1.0)));
}

#[test]
fn deep_chain_propagates() {
    let mut scene = Scene::new();
    let mut parent = scene.add_node(Node::new("bone_0"));
    scene.get_node_mut(parent).unwrap().transform.position = Vec3::Y;
    for i in 1..500 {
        let mut node = Node::new(&format!("bone_{i}"));
        node.transform.position = Vec3::Y;
        parent = scene.add_to_parent(node, parent);
    }
    scene.update_matrix_world();

    let world = scene.get_node(parent).unwrap().world_matrix();
    assert!((world.translation.y - 500.0).abs() < 1e-3);
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn bounding_box_helpers() {
    let b = BoundingBox::from_points([Vec3::ZERO, Vec3::new(2.0, 4.0, -2.0)]).unwrap();
    assert!(vec3_approx(b.center(), Vec3::new(1.0, 2.0, -1.0)));
    assert!(vec3_approx(b.size(), Vec3::new(2.0, 4.0, 2.0)));

    let other = BoundingBox::from_points([Vec3::splat(5.0)]).unwrap();
    let u = b.union(&other);
    assert!(vec3_approx(u.max, Vec3::splat(5.0)));
    assert!(vec3_approx(u.min, Vec3::new(0.0, 0.0, -2.0)));

    assert!(BoundingBox::from_points(std::iter::empty()).is_none());
}

#[test]
fn bounding_box_transform_rotates_corners() {
    let b = BoundingBox::from_points([Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0)]).unwrap();
    let t = b.transform(&Affine3A::from_rotation_z(FRAC_PI_2));
    assert!(vec3_approx(t.min, Vec3::new(-2.0, 0.0, 0.0)));
    assert!(vec3_approx(t.max, Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn scene_bounds_follow_placement() {
    let mut scene = Scene::new();
    let avatar = scene.add_node(Node::new("avatar"));
    let mut geometry = Geometry::new();
    geometry.positions = vec![[-0.5, 0.0, 0.0], [0.5, 1.0, 0.0]];
    scene.add_mesh_to_parent(Mesh::new(Arc::new(geometry), Material::new_basic(Vec4::ONE)), avatar);

    assert!(scene.compute_bounds(avatar).is_some());
    scene.set_placement(avatar, Vec3::new(0.0, 0.0, 0.5), 2.0);
    scene.update_matrix_world();

    let bounds = scene.compute_bounds(avatar).unwrap();
    assert!(vec3_approx(bounds.min, Vec3::new(-1.0, 0.0, 0.5)));
    assert!(vec3_approx(bounds.max, Vec3::new(1.0, 2.0, 0.5)));
}

// ============================================================================
// Frame timing
// ============================================================================

#[test]
fn fps_counter_reports_once_per_second() {
    let mut fps = FpsCounter::new();
    for _ in 0..59 {
        assert!(fps.update(1.0 / 60.0).is_none());
    }
    let reported = fps.update(1.0 / 60.0 + 1e-4).unwrap();
    assert!((reported - 60.0).abs() < 0.1, "got {reported}");
    assert!((fps.stats().frame_ms - 16.77).abs() < 0.1);
}

#[test]
fn fps_counter_starts_empty() {
    let fps = FpsCounter::new();
    assert!(approx_eq(fps.stats().fps, 0.0));
}

#[test]
fn timer_counts_ticks() {
    let mut timer = Timer::new();
    let first = timer.tick();
    let second = timer.tick();
    assert_eq!(first.frame_count, 1);
    assert_eq!(second.frame_count, 2);
    assert!(second.time >= first.time);
    assert!(second.dt >= 0.0);
}
