use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;
use crate::animation::values::MorphWeightData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once and hold the last frame.
    Once,
    /// Repeat forever.
    #[default]
    Loop,
    /// Alternate forward and backward forever.
    PingPong,
}

/// Playback state of one clip on one mixer root.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    /// Local clip time in seconds, always within `[0, duration]`.
    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    pub enabled: bool,

    pub bindings: Vec<PropertyBinding>,

    // Unwrapped play time; `time` is derived from it.
    elapsed: f32,
    pub(crate) track_cursors: Vec<KeyframeCursor>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            enabled: false,
            bindings: Vec::new(),
            elapsed: 0.0,
            track_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Starts playback from the beginning.
    pub fn play(&mut self) -> &mut Self {
        self.enabled = true;
        self.paused = false;
        self.elapsed = 0.0;
        self.time = 0.0;
        self
    }

    pub fn stop(&mut self) {
        self.enabled = false;
        self.elapsed = 0.0;
        self.time = 0.0;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused && self.weight > 0.0
    }

    /// Advances local time by `dt` scaled by `time_scale`.
    pub fn update(&mut self, dt: f32) {
        if self.paused || !self.enabled {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.elapsed += dt * self.time_scale;

        self.time = match self.loop_mode {
            LoopMode::Once => {
                if self.elapsed >= duration || self.elapsed < 0.0 {
                    self.paused = true;
                }
                self.elapsed.clamp(0.0, duration)
            }
            LoopMode::Loop => self.elapsed.rem_euclid(duration),
            LoopMode::PingPong => {
                let t = self.elapsed.rem_euclid(duration * 2.0);
                if t > duration { duration * 2.0 - t } else { t }
            }
        };
    }

    /// Samples track `track_index` at the current time.
    pub fn sample_track(&mut self, track_index: usize) -> Option<TrackValue> {
        let track = self.clip.tracks.get(track_index)?;
        let cursor = self.track_cursors.get_mut(track_index)?;
        let time = self.time;

        Some(match &track.data {
            TrackData::Vector3(t) => TrackValue::Vector3(t.sample_with_cursor(time, cursor)?),
            TrackData::Quaternion(t) => TrackValue::Quaternion(t.sample_with_cursor(time, cursor)?),
            TrackData::Scalar(t) => TrackValue::Scalar(t.sample_with_cursor(time, cursor)?),
            TrackData::MorphWeights(t) => {
                TrackValue::MorphWeights(t.sample_with_cursor(time, cursor)?)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackValue {
    Vector3(Vec3),
    Quaternion(Quat),
    Scalar(f32),
    MorphWeights(MorphWeightData),
}
