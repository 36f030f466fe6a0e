use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::app::context::{AppContext, LoopState};
use crate::utils::Timer;

/// Ticks `ctx` every `frame_interval` on the current task.
///
/// Stops after `max_frames` ticks when given, otherwise runs until the
/// task is dropped. Returns the state after the last tick.
pub async fn run_native(
    ctx: &mut AppContext,
    frame_interval: Duration,
    max_frames: Option<u64>,
) -> LoopState {
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut timer = Timer::new();
    loop {
        interval.tick().await;
        let frame = timer.tick();
        let state = ctx.tick(&frame);

        if max_frames.is_some_and(|max| frame.frame_count >= max) {
            log::info!(
                "Stopping after {} frames ({} rendered)",
                frame.frame_count,
                ctx.renderer().frame_count()
            );
            return state;
        }
    }
}
