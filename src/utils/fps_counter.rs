/// Snapshot shown by the performance overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames per second, refreshed once per second.
    pub fps: f32,
    /// Duration of the last frame in milliseconds.
    pub frame_ms: f32,
}

/// Frame-rate counter driving the performance overlay.
///
/// Fed with the frame delta rather than reading a clock, so the numbers
/// follow whatever clock drives the loop.
#[derive(Debug, Default)]
pub struct FpsCounter {
    frame_count: u32,
    accumulated_time: f32,
    stats: FrameStats,
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame. Returns the new fps value whenever a full second
    /// has accumulated.
    pub fn update(&mut self, dt: f32) -> Option<f32> {
        self.frame_count += 1;
        self.accumulated_time += dt;
        self.stats.frame_ms = dt * 1000.0;

        // Update statistics every 1 second
        if self.accumulated_time >= 1.0 {
            self.stats.fps = self.frame_count as f32 / self.accumulated_time;

            self.accumulated_time = 0.0;
            self.frame_count = 0;

            return Some(self.stats.fps);
        }

        None
    }

    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}
