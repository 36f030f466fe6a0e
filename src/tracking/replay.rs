//! Recorded-pose tracking backend
//!
//! Plays back marker poses from a JSON recording instead of a camera and
//! a detector. Used by the headless viewer and by tests.
//!
//! ```json
//! {
//!   "frame_size": [640, 480],
//!   "projection": [ ...16 floats, column-major... ],
//!   "poses": [ null, [ ...16 floats... ], ... ]
//! }
//! ```

use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

use glam::Mat4;
use serde::Deserialize;
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

use crate::errors::{ArError, Result};
use crate::render::Viewport;
use crate::tracking::{FrameSource, MarkerDetector, TrackingParams, VideoFrame};

fn default_frame_size() -> [u32; 2] {
    [640, 480]
}

/// Marker poses captured frame by frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoseRecording {
    #[serde(default = "default_frame_size")]
    pub frame_size: [u32; 2],
    /// Calibrated projection, column-major.
    pub projection: [f32; 16],
    /// Model-view matrix per frame, `null` where the marker was not seen.
    pub poses: Vec<Option<[f32; 16]>>,
}

impl PoseRecording {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array(&self.projection)
    }

    /// Pose of frame `frame_id`; the recording loops.
    #[must_use]
    pub fn pose(&self, frame_id: u64) -> Option<Mat4> {
        if self.poses.is_empty() {
            return None;
        }
        let index = (frame_id % self.poses.len() as u64) as usize;
        self.poses[index].as_ref().map(Mat4::from_cols_array)
    }
}

// ============================================================================
// Source
// ============================================================================

/// Frame source replaying a recording. Reports ready once `ready_delay`
/// has passed since [`FrameSource::start`].
pub struct ReplaySource {
    recording: Arc<PoseRecording>,
    ready_delay: Duration,
    started_at: Option<Instant>,
    element: Viewport,
    next_frame_id: u64,
}

impl ReplaySource {
    #[must_use]
    pub fn new(recording: Arc<PoseRecording>) -> Self {
        let [width, height] = recording.frame_size;
        Self {
            recording,
            ready_delay: Duration::ZERO,
            started_at: None,
            element: Viewport::new(width, height),
            next_frame_id: 0,
        }
    }

    #[must_use]
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    #[must_use]
    pub fn frames_captured(&self) -> u64 {
        self.next_frame_id
    }
}

impl FrameSource for ReplaySource {
    fn start(&mut self) -> Result<()> {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            log::debug!(
                "Replay source started ({} recorded frames)",
                self.recording.poses.len()
            );
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.started_at
            .is_some_and(|started| started.elapsed() >= self.ready_delay)
    }

    /// Scales the recorded frame to cover the viewport, keeping its aspect
    /// ratio.
    fn on_resize(&mut self, viewport: Viewport) {
        let [width, height] = self.recording.frame_size;
        if width == 0 || height == 0 || viewport.is_empty() {
            self.element = viewport;
            return;
        }

        let source_aspect = width as f32 / height as f32;
        self.element = if viewport.aspect() < source_aspect {
            Viewport::new(
                (viewport.height as f32 * source_aspect).round() as u32,
                viewport.height,
            )
        } else {
            Viewport::new(
                viewport.width,
                (viewport.width as f32 / source_aspect).round() as u32,
            )
        };
    }

    fn element_size(&self) -> Viewport {
        self.element
    }

    fn capture(&mut self) -> Option<VideoFrame> {
        if !self.is_ready() {
            return None;
        }
        let [width, height] = self.recording.frame_size;
        let frame = VideoFrame {
            frame_id: self.next_frame_id,
            width,
            height,
            pixels: Arc::from(Vec::<u8>::new()),
        };
        self.next_frame_id += 1;
        Some(frame)
    }
}

// ============================================================================
// Detector
// ============================================================================

/// Detector answering from a recording, keyed by frame id.
pub struct ReplayDetector {
    recording: Arc<PoseRecording>,
    calibrated: bool,
    pattern_loaded: bool,
    canvas: Option<Viewport>,
}

impl ReplayDetector {
    #[must_use]
    pub fn new(recording: Arc<PoseRecording>) -> Self {
        Self {
            recording,
            calibrated: false,
            pattern_loaded: false,
            canvas: None,
        }
    }

    #[must_use]
    pub fn canvas_size(&self) -> Option<Viewport> {
        self.canvas
    }
}

impl MarkerDetector for ReplayDetector {
    fn init(&mut self, calibration: &[u8], params: &TrackingParams) -> Result<()> {
        if calibration.is_empty() {
            return Err(ArError::TrackingError(format!(
                "camera calibration '{}' is empty",
                params.camera_parameters_url
            )));
        }
        self.calibrated = true;
        Ok(())
    }

    fn projection_matrix(&self) -> Option<Mat4> {
        self.calibrated.then(|| self.recording.projection())
    }

    fn load_pattern(&mut self, pattern: &[u8]) -> Result<()> {
        if pattern.is_empty() {
            return Err(ArError::TrackingError("marker pattern is empty".to_string()));
        }
        self.pattern_loaded = true;
        Ok(())
    }

    fn has_controller(&self) -> bool {
        self.calibrated
    }

    fn resize_canvas(&mut self, size: Viewport) {
        self.canvas = Some(size);
    }

    fn detect(&mut self, frame: &VideoFrame) -> Option<Mat4> {
        if !self.pattern_loaded {
            return None;
        }
        self.recording.pose(frame.frame_id)
    }
}
