//! Animation retargeting
//!
//! Adapts a clip authored for one skeleton (Mixamo-style names, Y-up,
//! facing +Z) to the avatar's skeleton (VRoid `J_Bip_*` names). Node names
//! are renamed through [`RetargetConfig::bone_map`] and keyframes are
//! rotated into the avatar's basis.
//!
//! The result only depends on the clip's content and the config: tracks
//! come out sorted by `(node, target)`, so shuffling the input tracks does
//! not change the output.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::animation::values::Interpolatable;

const SIDES: [(&str, &str); 2] = [("Left", "L"), ("Right", "R")];

const CENTER_BONES: [(&str, &str); 6] = [
    ("Hips", "J_Bip_C_Hips"),
    ("Spine", "J_Bip_C_Spine"),
    ("Spine1", "J_Bip_C_Chest"),
    ("Spine2", "J_Bip_C_UpperChest"),
    ("Neck", "J_Bip_C_Neck"),
    ("Head", "J_Bip_C_Head"),
];

const LIMB_BONES: [(&str, &str); 9] = [
    ("Shoulder", "Shoulder"),
    ("Arm", "UpperArm"),
    ("ForeArm", "LowerArm"),
    ("Hand", "Hand"),
    ("UpLeg", "UpperLeg"),
    ("Leg", "LowerLeg"),
    ("Foot", "Foot"),
    ("ToeBase", "ToeBase"),
    ("Eye", "FaceEye"),
];

const FINGERS: [(&str, &str); 5] = [
    ("Thumb", "Thumb"),
    ("Index", "Index"),
    ("Middle", "Middle"),
    ("Ring", "Ring"),
    ("Pinky", "Little"),
];

/// Settings for [`retarget_clip`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Source bone name (after prefix stripping) to avatar bone name.
    pub bone_map: BTreeMap<String, String>,
    /// Prefixes removed from source names, first match only.
    pub source_prefixes: Vec<String>,
    /// Rotation from the source basis into the avatar basis, XYZ Euler
    /// angles in degrees.
    pub basis_euler_degrees: [f32; 3],
    /// Multiplier applied to translation keyframes (e.g. 0.01 for
    /// centimetre sources).
    pub translation_scale: f32,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            bone_map: default_bone_map(),
            source_prefixes: vec!["mixamorig:".to_string(), "mixamorig".to_string()],
            basis_euler_degrees: [0.0, 180.0, 0.0],
            translation_scale: 1.0,
        }
    }
}

impl RetargetConfig {
    #[must_use]
    pub fn basis(&self) -> Quat {
        let [x, y, z] = self.basis_euler_degrees;
        Quat::from_euler(EulerRot::XYZ, x.to_radians(), y.to_radians(), z.to_radians())
    }

    /// Maps a source node name to the avatar's node name.
    ///
    /// Names that are not in the map pass through with only the prefix
    /// removed.
    #[must_use]
    pub fn map_name(&self, source: &str) -> String {
        let stripped = self
            .source_prefixes
            .iter()
            .find_map(|prefix| source.strip_prefix(prefix.as_str()))
            .unwrap_or(source);

        self.bone_map
            .get(stripped)
            .cloned()
            .unwrap_or_else(|| stripped.to_string())
    }
}

/// Mixamo-style bone names to VRoid `J_Bip_*` names.
#[must_use]
pub fn default_bone_map() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    for (src, dst) in CENTER_BONES {
        map.insert(src.to_string(), dst.to_string());
    }

    for (side, tag) in SIDES {
        for (src, dst) in LIMB_BONES {
            map.insert(format!("{side}{src}"), format!("J_Bip_{tag}_{dst}"));
        }
        for (src, dst) in FINGERS {
            for joint in 1..=3 {
                map.insert(
                    format!("{side}Hand{src}{joint}"),
                    format!("J_Bip_{tag}_{dst}{joint}"),
                );
            }
        }
    }

    map
}

/// Produces a copy of `clip` that drives the avatar's skeleton.
///
/// - node names: prefix stripping, then the bone map
/// - translations: `basis * v * translation_scale`
/// - rotations: `basis * q * basis⁻¹`, tangents included
/// - scale, scalar and morph weight tracks: unchanged
///
/// When several source tracks land on the same node and property, the one
/// whose source name sorts first is kept. Equal names fall back to the
/// keyframe content, compared with `f32::total_cmp`.
#[must_use]
pub fn retarget_clip(clip: &AnimationClip, config: &RetargetConfig) -> AnimationClip {
    let basis = config.basis();
    let basis_inv = basis.inverse();
    let scale = config.translation_scale;

    let mut by_target: BTreeMap<(String, TargetPath), (&str, Vec<f32>, TrackData)> =
        BTreeMap::new();

    for track in &clip.tracks {
        let node_name = config.map_name(&track.meta.node_name);
        let data = match &track.data {
            TrackData::Vector3(t) if track.meta.target == TargetPath::Translation => {
                TrackData::Vector3(map_track(t, |v: &Vec3| basis * *v * scale))
            }
            TrackData::Quaternion(t) => {
                TrackData::Quaternion(map_track(t, |q: &Quat| basis * *q * basis_inv))
            }
            other => other.clone(),
        };

        let key = (node_name, track.meta.target);
        let source = track.meta.node_name.as_str();
        let content = content_key(&track.data);
        let keep_existing = by_target.get(&key).is_some_and(|(name, existing, _)| {
            (*name).cmp(source)
                .then_with(|| cmp_floats(existing, &content))
                .is_le()
        });
        if !keep_existing {
            by_target.insert(key, (source, content, data));
        }
    }

    let tracks = by_target
        .into_iter()
        .map(|((node_name, target), (_, _, data))| Track {
            meta: TrackMeta { node_name, target },
            data,
        })
        .collect();

    AnimationClip::new(clip.name.clone(), tracks)
}

/// Flattens a track into floats: variant, interpolation, times, values.
fn content_key(data: &TrackData) -> Vec<f32> {
    fn flatten<T: Interpolatable>(
        variant: f32,
        track: &KeyframeTrack<T>,
        push: impl Fn(&T, &mut Vec<f32>),
    ) -> Vec<f32> {
        let interpolation = match track.interpolation {
            InterpolationMode::Linear => 0.0,
            InterpolationMode::Step => 1.0,
            InterpolationMode::CubicSpline => 2.0,
        };
        let mut key = vec![variant, interpolation, track.times.len() as f32];
        key.extend_from_slice(&track.times);
        for value in &track.values {
            push(value, &mut key);
        }
        key
    }

    match data {
        TrackData::Vector3(t) => flatten(0.0, t, |v, key| key.extend_from_slice(&v.to_array())),
        TrackData::Quaternion(t) => flatten(1.0, t, |q, key| key.extend_from_slice(&q.to_array())),
        TrackData::Scalar(t) => flatten(2.0, t, |s, key| key.push(*s)),
        TrackData::MorphWeights(t) => flatten(3.0, t, |w, key| {
            key.push(w.weights.len() as f32);
            key.extend_from_slice(&w.weights);
        }),
    }
}

fn cmp_floats(a: &[f32], b: &[f32]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn map_track<T, F>(track: &KeyframeTrack<T>, f: F) -> KeyframeTrack<T>
where
    T: Interpolatable,
    F: Fn(&T) -> T,
{
    KeyframeTrack::new(
        track.times.clone(),
        track.values.iter().map(f).collect(),
        track.interpolation,
    )
}
