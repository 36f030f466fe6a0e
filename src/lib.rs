//! # marker-avatar
//!
//! Shows a 3D avatar standing on a printed marker in a live camera feed.
//! The marker's pose places the avatar; a borrowed skeletal animation,
//! retargeted onto the avatar's rig, plays on it.
//!
//! ## Pieces
//!
//! - [`config`]: fixed defaults and the placement policy (`?stand=1`)
//! - [`app`]: initialization barrier and the Waiting/Tracking frame loop
//! - [`tracking`]: frame source and detector traits, pose smoothing
//! - [`render`]: drawing surface trait and renderer
//! - [`assets`]: file/HTTP readers and the glTF/VRM loader
//! - [`scene`], [`resources`], [`animation`]: scene graph, materials,
//!   keyframe animation and retargeting
//!
//! Camera access, marker detection and GPU drawing are external services
//! reached through [`tracking::FrameSource`], [`tracking::MarkerDetector`]
//! and [`render::RenderSurface`]. The crate ships a recorded-pose backend
//! and a headless surface so the loop runs without either.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marker_avatar::prelude::*;
//!
//! let recording = Arc::new(PoseRecording::load("poses.json")?);
//! let ctx = app::init(
//!     AppConfig::default(),
//!     Box::new(StaticHost::new("?stand=1", Viewport::new(1280, 720))),
//!     Box::new(HeadlessSurface::new()),
//!     TrackingBackend {
//!         source: Box::new(ReplaySource::new(recording.clone())),
//!         detector: Box::new(ReplayDetector::new(recording)),
//!     },
//!     Arc::new(GltfAssetProvider::new(AssetReaderVariant::from_source("./")?)),
//! )
//! .await?;
//! ```

#[cfg(all(target_arch = "wasm32", not(feature = "http")))]
compile_error!("the browser build reads assets over HTTP; enable the `http` feature");

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod errors;
pub mod render;
pub mod resources;
pub mod scene;
pub mod tracking;
pub mod utils;

pub use animation::{
    AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode, RetargetConfig,
    retarget_clip,
};
pub use app::{AppContext, Host, LoopState, StaticHost, TrackingBackend};
pub use assets::{AssetProvider, AssetReader, AssetReaderVariant, ModelPrefab};
pub use config::{AppConfig, Placement};
pub use errors::{ArError, Result};
pub use render::{HeadlessSurface, RenderSurface, Renderer, RendererSettings, Viewport};
pub use resources::{Material, Mesh, convert_to_unlit};
pub use scene::{Camera, Node, NodeHandle, Scene};
pub use tracking::{
    FrameSource, MarkerDetector, PoseRecording, ReplayDetector, ReplaySource, SmoothingParams,
    TrackingParams,
};
pub use utils::{FrameState, Timer};

pub mod prelude {
    pub use crate::app::{self, AppContext, Host, LoopState, StaticHost, TrackingBackend};
    #[cfg(feature = "gltf")]
    pub use crate::assets::GltfAssetProvider;
    pub use crate::assets::{AssetProvider, AssetReaderVariant};
    pub use crate::config::{AppConfig, Placement};
    pub use crate::errors::{ArError, Result};
    pub use crate::render::{HeadlessSurface, RenderSurface, Viewport};
    pub use crate::tracking::{FrameSource, MarkerDetector, PoseRecording, ReplayDetector, ReplaySource};
    pub use crate::utils::{FrameState, Timer};
}
