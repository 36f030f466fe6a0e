//! Retargeting Tests
//!
//! Tests for:
//! - Bone name mapping (prefix stripping, bone map, pass-through)
//! - Basis change of translation and rotation keyframes
//! - Deterministic output order and duplicate resolution

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use marker_avatar::animation::{
    AnimationClip, InterpolationMode, KeyframeTrack, MorphWeightData, RetargetConfig, TargetPath,
    Track, TrackData, TrackMeta, retarget_clip,
};

const EPSILON: f32 = 1e-4;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn translation(node: &str, value: Vec3) -> Track {
    Track {
        meta: TrackMeta {
            node_name: node.to_string(),
            target: TargetPath::Translation,
        },
        data: TrackData::Vector3(KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, value],
            InterpolationMode::Linear,
        )),
    }
}

fn rotation(node: &str, value: Quat) -> Track {
    Track {
        meta: TrackMeta {
            node_name: node.to_string(),
            target: TargetPath::Rotation,
        },
        data: TrackData::Quaternion(KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, value],
            InterpolationMode::Linear,
        )),
    }
}

fn last_vec3(track: &Track) -> Vec3 {
    match &track.data {
        TrackData::Vector3(t) => *t.values.last().unwrap(),
        other => panic!("expected Vector3 track, got {other:?}"),
    }
}

fn last_quat(track: &Track) -> Quat {
    match &track.data {
        TrackData::Quaternion(t) => *t.values.last().unwrap(),
        other => panic!("expected Quaternion track, got {other:?}"),
    }
}

// ============================================================================
// Name mapping
// ============================================================================

#[test]
fn map_name_strips_prefix_and_maps() {
    let config = RetargetConfig::default();
    assert_eq!(config.map_name("mixamorig:Hips"), "J_Bip_C_Hips");
    assert_eq!(config.map_name("mixamorigLeftArm"), "J_Bip_L_UpperArm");
    assert_eq!(config.map_name("RightHandIndex2"), "J_Bip_R_Index2");
    assert_eq!(config.map_name("LeftHandPinky3"), "J_Bip_L_Little3");
    assert_eq!(config.map_name("Spine2"), "J_Bip_C_UpperChest");
}

#[test]
fn map_name_passes_unknown_names_through() {
    let config = RetargetConfig::default();
    assert_eq!(config.map_name("mixamorig:Prop"), "Prop");
    assert_eq!(config.map_name("J_Bip_C_Head"), "J_Bip_C_Head");
}

#[test]
fn retargeted_tracks_use_avatar_names() {
    let clip = AnimationClip::new(
        "dance".to_string(),
        vec![
            rotation("mixamorig:Hips", Quat::IDENTITY),
            rotation("mixamorig:Head", Quat::IDENTITY),
        ],
    );
    let out = retarget_clip(&clip, &RetargetConfig::default());

    let names: Vec<&str> = out.tracks.iter().map(|t| t.meta.node_name.as_str()).collect();
    assert_eq!(names, vec!["J_Bip_C_Head", "J_Bip_C_Hips"]);
    assert_eq!(out.name, "dance");
    assert!((out.duration - clip.duration).abs() < EPSILON);
}

// ============================================================================
// Basis change
// ============================================================================

#[test]
fn default_basis_turns_half_around_y() {
    let config = RetargetConfig::default();
    let v = config.basis() * Vec3::new(1.0, 2.0, 3.0);
    assert!(approx_vec(v, Vec3::new(-1.0, 2.0, -3.0)), "got {v}");
}

#[test]
fn translations_are_rotated_and_scaled() {
    let config = RetargetConfig {
        translation_scale: 0.01,
        ..RetargetConfig::default()
    };
    let clip = AnimationClip::new(
        "walk".to_string(),
        vec![translation("mixamorig:Hips", Vec3::new(100.0, 50.0, 200.0))],
    );

    let out = retarget_clip(&clip, &config);
    let v = last_vec3(&out.tracks[0]);
    assert!(approx_vec(v, Vec3::new(-1.0, 0.5, -2.0)), "got {v}");
}

#[test]
fn rotations_are_conjugated_by_basis() {
    let clip = AnimationClip::new(
        "wave".to_string(),
        vec![rotation("mixamorig:LeftArm", Quat::from_rotation_x(FRAC_PI_2))],
    );

    let out = retarget_clip(&clip, &RetargetConfig::default());
    let q = last_quat(&out.tracks[0]);
    let expected = Quat::from_rotation_x(-FRAC_PI_2);
    assert!(q.angle_between(expected) < EPSILON, "got {q}");
}

#[test]
fn identity_basis_keeps_values() {
    let config = RetargetConfig {
        basis_euler_degrees: [0.0, 0.0, 0.0],
        ..RetargetConfig::default()
    };
    let q = Quat::from_rotation_z(0.3);
    let clip = AnimationClip::new(
        "idle".to_string(),
        vec![
            rotation("Neck", q),
            translation("Hips", Vec3::new(1.0, 2.0, 3.0)),
        ],
    );

    let out = retarget_clip(&clip, &config);
    let hips = out.tracks.iter().find(|t| t.meta.node_name == "J_Bip_C_Hips").unwrap();
    let neck = out.tracks.iter().find(|t| t.meta.node_name == "J_Bip_C_Neck").unwrap();
    assert!(approx_vec(last_vec3(hips), Vec3::new(1.0, 2.0, 3.0)));
    assert!(last_quat(neck).angle_between(q) < EPSILON);
}

#[test]
fn morph_weight_tracks_are_untouched() {
    let weights = TrackData::MorphWeights(KeyframeTrack::new(
        vec![0.0],
        vec![MorphWeightData::from_slice(&[0.5])],
        InterpolationMode::Step,
    ));
    let clip = AnimationClip::new(
        "face".to_string(),
        vec![Track {
            meta: TrackMeta {
                node_name: "Face".to_string(),
                target: TargetPath::Weights,
            },
            data: weights.clone(),
        }],
    );

    let out = retarget_clip(&clip, &RetargetConfig::default());
    assert_eq!(out.tracks[0].data, weights);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn output_is_independent_of_track_order() {
    let tracks = vec![
        rotation("mixamorig:Hips", Quat::from_rotation_y(0.2)),
        translation("mixamorig:Hips", Vec3::X),
        rotation("mixamorig:LeftLeg", Quat::from_rotation_x(0.4)),
        rotation("mixamorig:RightArm", Quat::from_rotation_z(0.1)),
        rotation("mixamorig:Spine", Quat::IDENTITY),
    ];
    let config = RetargetConfig::default();
    let forward = retarget_clip(&AnimationClip::new("m".to_string(), tracks.clone()), &config);

    let mut reversed = tracks.clone();
    reversed.reverse();
    let backward = retarget_clip(&AnimationClip::new("m".to_string(), reversed), &config);

    let mut rotated = tracks;
    rotated.rotate_left(2);
    let shifted = retarget_clip(&AnimationClip::new("m".to_string(), rotated), &config);

    assert_eq!(forward, backward);
    assert_eq!(forward, shifted);
}

#[test]
fn duplicate_targets_keep_smallest_source_name() {
    // Both land on J_Bip_C_Hips rotation
    let clip = AnimationClip::new(
        "dup".to_string(),
        vec![
            rotation("mixamorigHips", Quat::from_rotation_y(1.0)),
            rotation("mixamorig:Hips", Quat::from_rotation_y(0.5)),
        ],
    );
    let config = RetargetConfig {
        basis_euler_degrees: [0.0, 0.0, 0.0],
        ..RetargetConfig::default()
    };

    let out = retarget_clip(&clip, &config);
    assert_eq!(out.tracks.len(), 1);
    // "mixamorig:Hips" < "mixamorigHips"
    let q = last_quat(&out.tracks[0]);
    assert!(q.angle_between(Quat::from_rotation_y(0.5)) < EPSILON);
}

#[test]
fn duplicate_targets_with_equal_names_ignore_track_order() {
    let tracks = vec![
        rotation("mixamorig:Hips", Quat::from_rotation_y(1.0)),
        rotation("mixamorig:Hips", Quat::from_rotation_y(0.5)),
    ];
    let config = RetargetConfig {
        basis_euler_degrees: [0.0, 0.0, 0.0],
        ..RetargetConfig::default()
    };

    let forward = retarget_clip(&AnimationClip::new("dup".to_string(), tracks.clone()), &config);
    let mut reversed = tracks;
    reversed.reverse();
    let backward = retarget_clip(&AnimationClip::new("dup".to_string(), reversed), &config);

    assert_eq!(forward, backward);
    assert_eq!(forward.tracks.len(), 1);
    // Keyframe content breaks the tie: the smaller y component wins
    let q = last_quat(&forward.tracks[0]);
    assert!(q.angle_between(Quat::from_rotation_y(0.5)) < EPSILON);
}
