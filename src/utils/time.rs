#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

use std::future::Future;

use crate::errors::Result;

/// Per-frame timing handed to the update loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    /// Seconds since the clock started.
    pub time: f64,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Number of ticks so far, this one included.
    pub frame_count: u64,
}

/// Frame clock: tracks elapsed time between ticks.
pub struct Timer {
    start_time: Instant,
    last_update: Instant,
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time since creation
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Creates a new timer starting from now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_update: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances the clock and returns the frame state for this tick.
    pub fn tick(&mut self) -> FrameState {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.elapsed = now - self.start_time;
        self.last_update = now;
        self.frame_count += 1;
        self.frame_state()
    }

    #[must_use]
    pub fn frame_state(&self) -> FrameState {
        FrameState {
            time: self.elapsed.as_secs_f64(),
            dt: self.dt_seconds(),
            frame_count: self.frame_count,
        }
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Awaits `fut`, giving up after `limit` with [`ArError::Timeout`] naming
/// `asset`. `None` waits forever.
///
/// The browser build has no timer runtime and always waits.
///
/// [`ArError::Timeout`]: crate::errors::ArError::Timeout
pub async fn with_timeout<T>(
    asset: &str,
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Some(after) = limit {
        return tokio::time::timeout(after, fut)
            .await
            .map_err(|_| crate::errors::ArError::Timeout {
                asset: asset.to_string(),
                after,
            })?;
    }

    #[cfg(target_arch = "wasm32")]
    if limit.is_some() {
        log::debug!("Timeouts are not available in the browser, waiting for '{asset}'");
    }

    fut.await
}
