use std::time::Duration;

use glam::Mat4;

use crate::assets::AssetProvider;
use crate::errors::Result;
use crate::render::Viewport;
use crate::scene::{Node, NodeHandle, Scene};
use crate::tracking::smoothing::{SmoothedControls, SmoothingEvent, SmoothingParams};
use crate::tracking::{FrameSource, MarkerDetector, MarkerKind, TrackingParams, VideoFrame};
use crate::utils::with_timeout;

// ============================================================================
// Marker controls
// ============================================================================

/// Drives one node from the detector's raw marker pose.
///
/// The node is hidden at the start of every detection pass and shown again
/// only when the marker is found, so it is visible exactly while the last
/// detection saw the marker.
#[derive(Debug, Clone)]
pub struct MarkerControls {
    group: NodeHandle,
    kind: MarkerKind,
    pattern_url: String,
}

impl MarkerControls {
    #[must_use]
    pub fn new(group: NodeHandle, params: &TrackingParams) -> Self {
        Self {
            group,
            kind: params.marker_kind,
            pattern_url: params.pattern_url.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn group(&self) -> NodeHandle {
        self.group
    }

    #[must_use]
    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    #[must_use]
    pub fn pattern_url(&self) -> &str {
        &self.pattern_url
    }

    fn hide(&self, scene: &mut Scene) {
        if let Some(node) = scene.get_node_mut(self.group) {
            node.visible = false;
        }
    }

    fn apply_pose(&self, scene: &mut Scene, model_view: Mat4) {
        if let Some(node) = scene.get_node_mut(self.group) {
            node.visible = true;
            node.transform.apply_local_matrix_from_mat4(model_view);
        }
    }
}

// ============================================================================
// Tracking context
// ============================================================================

/// Detector wrapper enforcing the detection rate cap.
pub struct TrackingContext {
    detector: Box<dyn MarkerDetector>,
    params: TrackingParams,
    last_detection_at: Option<f64>,
    detection_count: u64,
}

impl TrackingContext {
    #[must_use]
    pub fn new(detector: Box<dyn MarkerDetector>, params: TrackingParams) -> Self {
        Self {
            detector,
            params,
            last_detection_at: None,
            detection_count: 0,
        }
    }

    #[must_use]
    pub fn params(&self) -> &TrackingParams {
        &self.params
    }

    pub fn init(&mut self, calibration: &[u8]) -> Result<()> {
        self.detector.init(calibration, &self.params)
    }

    pub fn load_pattern(&mut self, pattern: &[u8]) -> Result<()> {
        self.detector.load_pattern(pattern)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Option<Mat4> {
        self.detector.projection_matrix()
    }

    #[must_use]
    pub fn has_controller(&self) -> bool {
        self.detector.has_controller()
    }

    pub fn resize_canvas(&mut self, size: Viewport) {
        self.detector.resize_canvas(size);
    }

    /// Number of detection passes run so far.
    #[must_use]
    pub fn detection_count(&self) -> u64 {
        self.detection_count
    }

    /// Runs one detection pass on `frame` unless the previous one was less
    /// than `1 / max_detection_rate` seconds ago. Returns whether it ran.
    pub fn update(
        &mut self,
        frame: &VideoFrame,
        now: f64,
        controls: &MarkerControls,
        scene: &mut Scene,
    ) -> bool {
        if let Some(last) = self.last_detection_at
            && now - last < self.params.detection_interval()
        {
            return false;
        }
        self.last_detection_at = Some(now);
        self.detection_count += 1;

        controls.hide(scene);
        if let Some(model_view) = self.detector.detect(frame) {
            controls.apply_pose(scene, model_view);
        }
        true
    }
}

// ============================================================================
// Tracking rig
// ============================================================================

/// Tracked part of the scene and the services behind it.
///
/// ```text
/// scene
/// ├── marker group      (raw pose, MarkerControls)
/// └── smoothed group    (SmoothedControls)
///     └── marker scene  (renderable content)
/// ```
pub struct TrackingRig {
    pub source: Box<dyn FrameSource>,
    pub context: TrackingContext,
    pub controls: MarkerControls,
    pub smoothed: SmoothedControls,
    pub marker_group: NodeHandle,
    pub smoothed_group: NodeHandle,
    pub marker_scene: NodeHandle,
}

impl TrackingRig {
    /// Builds the tracked nodes. Nothing is started yet.
    pub fn new(
        scene: &mut Scene,
        source: Box<dyn FrameSource>,
        detector: Box<dyn MarkerDetector>,
        params: TrackingParams,
        smoothing: SmoothingParams,
    ) -> Self {
        let mut marker = Node::new("MarkerGroup");
        marker.visible = false;
        let marker_group = scene.add_node(marker);

        let mut smoothed = Node::new("SmoothedGroup");
        smoothed.visible = false;
        let smoothed_group = scene.add_node(smoothed);

        let marker_scene = scene.add_to_parent(Node::new("MarkerScene"), smoothed_group);

        Self {
            source,
            controls: MarkerControls::new(marker_group, &params),
            context: TrackingContext::new(detector, params),
            smoothed: SmoothedControls::new(smoothing),
            marker_group,
            smoothed_group,
            marker_scene,
        }
    }

    /// Starts the camera, loads the calibration and the marker pattern.
    /// Each fetch is bounded by `timeout`.
    ///
    /// Camera readiness is not awaited; the loop polls it.
    pub async fn start<A: AssetProvider>(
        &mut self,
        assets: &A,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.source.start()?;

        let calibration_url = self.context.params().camera_parameters_url.clone();
        let calibration =
            with_timeout(&calibration_url, timeout, assets.read_bytes(&calibration_url)).await?;
        self.context.init(&calibration)?;

        let pattern_url = self.controls.pattern_url().to_string();
        let pattern = with_timeout(&pattern_url, timeout, assets.read_bytes(&pattern_url)).await?;
        self.context.load_pattern(&pattern)?;

        log::info!(
            "Tracking started ({:?} marker '{}', max {} detections/s)",
            self.controls.kind(),
            self.controls.pattern_url(),
            self.context.params().max_detection_rate
        );
        Ok(())
    }

    /// Fits the source element to `viewport` and returns its new size.
    pub fn fit_source(&mut self, viewport: Viewport) -> Viewport {
        self.source.on_resize(viewport);
        self.source.element_size()
    }

    /// Copies `size` to the detector canvas once the detector has one.
    pub fn resize_detector(&mut self, size: Viewport) {
        if self.context.has_controller() {
            self.context.resize_canvas(size);
        }
    }

    /// Detection on the latest frame, then one smoothing update.
    pub fn update(&mut self, scene: &mut Scene, now: f64) {
        if let Some(frame) = self.source.capture() {
            self.context.update(&frame, now, &self.controls, scene);
        }

        match self
            .smoothed
            .update(scene, self.marker_group, self.smoothed_group, now)
        {
            Some(SmoothingEvent::BecameVisible) => log::debug!("Marker found"),
            Some(SmoothingEvent::BecameHidden) => log::debug!("Marker lost"),
            None => {}
        }
    }
}
