//! Application layer
//!
//! - [`init`]: initialization barrier (renderer + scene/tracking + avatar)
//! - [`AppContext`]: state between frames and the per-frame [`AppContext::tick`]
//! - [`Host`]: the page or platform (query string, viewport, overlay)
//! - drivers: [`run_native`] on desktop, [`web::run_web`] in the browser

pub mod context;
pub mod host;
#[cfg(not(target_arch = "wasm32"))]
pub mod runner;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::future::Future;

pub use context::{AppContext, AssetEvent, LoopState, TrackingBackend, init};
pub use host::{Host, StaticHost};
#[cfg(not(target_arch = "wasm32"))]
pub use runner::run_native;

/// Runs `f` in the background without awaiting it.
#[cfg(not(target_arch = "wasm32"))]
pub fn execute_future<F: Future<Output = ()> + Send + 'static>(f: F) {
    tokio::spawn(f);
}

#[cfg(target_arch = "wasm32")]
pub fn execute_future<F: Future<Output = ()> + 'static>(f: F) {
    wasm_bindgen_futures::spawn_local(f);
}
