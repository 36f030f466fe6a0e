use crate::render::Viewport;
use crate::utils::FrameStats;

/// The page or platform the viewer runs in.
pub trait Host {
    /// Query string of the page URL, with or without the leading `?`.
    fn query_string(&self) -> String;

    fn viewport(&self) -> Viewport;

    fn set_loading_visible(&mut self, visible: bool);

    /// Schedules the next tick.
    fn request_frame(&mut self);

    /// Refreshes the performance overlay.
    fn update_stats(&mut self, stats: &FrameStats);
}

/// Host for headless runs: fixed viewport and query string, overlay
/// updates go to the log.
#[derive(Debug, Clone)]
pub struct StaticHost {
    query: String,
    viewport: Viewport,
    loading_visible: bool,
    frames_requested: u64,
}

impl StaticHost {
    #[must_use]
    pub fn new(query: &str, viewport: Viewport) -> Self {
        Self {
            query: query.to_string(),
            viewport,
            loading_visible: true,
            frames_requested: 0,
        }
    }

    #[must_use]
    pub fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    #[must_use]
    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }
}

impl Host for StaticHost {
    fn query_string(&self) -> String {
        self.query.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_loading_visible(&mut self, visible: bool) {
        self.loading_visible = visible;
    }

    fn request_frame(&mut self) {
        self.frames_requested += 1;
    }

    fn update_stats(&mut self, stats: &FrameStats) {
        log::trace!("{:.1} fps ({:.2} ms)", stats.fps, stats.frame_ms);
    }
}
