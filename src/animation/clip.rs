use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::KeyframeTrack;
use crate::animation::values::MorphWeightData;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackMeta {
    pub node_name: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Scalar(KeyframeTrack<f32>),
    MorphWeights(KeyframeTrack<MorphWeightData>),
}

impl TrackData {
    #[must_use]
    pub fn duration(&self) -> f32 {
        match self {
            Self::Vector3(t) => t.duration(),
            Self::Quaternion(t) => t.duration(),
            Self::Scalar(t) => t.duration(),
            Self::MorphWeights(t) => t.duration(),
        }
    }
}

/// A track: which node property it drives plus its keyframes.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// End time of the longest track.
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: String, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.duration())
            .fold(0.0_f32, f32::max);

        Self {
            name,
            duration,
            tracks,
        }
    }
}
