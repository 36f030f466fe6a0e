//! Utility Module
//!
//! - [`Timer`]: frame clock producing [`FrameState`] for each loop tick
//! - [`FpsCounter`]: frame rate measurement behind the performance overlay

pub mod fps_counter;
pub mod time;

pub use fps_counter::{FpsCounter, FrameStats};
pub use time::{FrameState, Timer, with_timeout};
