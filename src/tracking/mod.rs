//! Marker tracking
//!
//! The camera feed and the marker detector are external services reached
//! through two traits:
//! - [`FrameSource`]: camera permission, readiness and video frames
//! - [`MarkerDetector`]: calibration, pattern and per-frame detection
//!
//! On top of them this module builds the tracked part of the scene graph
//! ([`TrackingRig`]): a marker group carrying the raw pose, a smoothed
//! group following it, and a marker scene under the smoothed group that
//! holds the renderable content.

pub mod context;
pub mod replay;
pub mod smoothing;

use std::sync::Arc;

use glam::Mat4;
use serde::Deserialize;

use crate::config::{CAMERA_PARAMETERS_URL, MAX_DETECTION_RATE, PATTERN_RATIO, PATTERN_URL};
use crate::errors::Result;
use crate::render::Viewport;

pub use context::{MarkerControls, TrackingContext, TrackingRig};
pub use replay::{PoseRecording, ReplayDetector, ReplaySource};
pub use smoothing::{SmoothedControls, SmoothingEvent, SmoothingParams};

/// How the marker is described to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// Trained pattern file inside a black border.
    #[default]
    Pattern,
}

/// Detector configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackingParams {
    pub camera_parameters_url: String,
    pub pattern_url: String,
    /// Inner pattern width over the full marker width.
    pub pattern_ratio: f32,
    /// Upper bound on detections per second.
    pub max_detection_rate: f32,
    pub marker_kind: MarkerKind,
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            camera_parameters_url: CAMERA_PARAMETERS_URL.to_string(),
            pattern_url: PATTERN_URL.to_string(),
            pattern_ratio: PATTERN_RATIO,
            max_detection_rate: MAX_DETECTION_RATE,
            marker_kind: MarkerKind::Pattern,
        }
    }
}

impl TrackingParams {
    /// Minimum time between two detections, in seconds.
    #[must_use]
    pub fn detection_interval(&self) -> f64 {
        if self.max_detection_rate > 0.0 {
            1.0 / f64::from(self.max_detection_rate)
        } else {
            0.0
        }
    }
}

/// One captured camera frame.
///
/// The pixel layout is whatever the source and detector agree on; the
/// loop only passes the frame along.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Monotonic frame number assigned by the source.
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

/// Camera feed.
pub trait FrameSource {
    /// Requests camera access and starts streaming. Readiness is reported
    /// later through [`FrameSource::is_ready`].
    fn start(&mut self) -> Result<()>;

    /// Polled every tick until it returns `true`.
    fn is_ready(&self) -> bool;

    /// Fits the source element to the viewport.
    fn on_resize(&mut self, viewport: Viewport);

    /// Current size of the source element, copied to the drawing surface
    /// and to the detector canvas.
    fn element_size(&self) -> Viewport;

    /// Latest frame, if one is available.
    fn capture(&mut self) -> Option<VideoFrame>;
}

/// Marker detection engine.
pub trait MarkerDetector {
    /// Loads the camera calibration. The projection matrix may become
    /// available later.
    fn init(&mut self, calibration: &[u8], params: &TrackingParams) -> Result<()>;

    /// Calibrated projection, once ready.
    fn projection_matrix(&self) -> Option<Mat4>;

    fn load_pattern(&mut self, pattern: &[u8]) -> Result<()>;

    /// Whether the internal controller (and its canvas) exists yet.
    fn has_controller(&self) -> bool;

    fn resize_canvas(&mut self, size: Viewport);

    /// Model-view matrix of the marker in `frame`, `None` when not found.
    fn detect(&mut self, frame: &VideoFrame) -> Option<Mat4>;
}
