//! Application context
//!
//! Everything the viewer needs between frames lives in one
//! [`AppContext`], built by [`init`] and advanced by [`AppContext::tick`].
//!
//! # Lifecycle
//!
//! ```text
//! init ──► Waiting ──(source ready)──► Tracking ──► Tracking ...
//! ```
//!
//! `init` runs the renderer and scene initializers concurrently and only
//! returns once both are done and the avatar is in the scene. The motion
//! asset loads in the background; its clips are picked up by the first
//! tracking tick after they arrive.

use std::sync::Arc;

use glam::Vec3;

use crate::animation::{AnimationClip, AnimationMixer};
use crate::animation::retarget::retarget_clip;
use crate::app::execute_future;
use crate::app::host::Host;
use crate::assets::AssetProvider;
use crate::config::{AppConfig, Placement};
use crate::errors::Result;
use crate::render::{RenderSurface, Renderer, Viewport};
use crate::resources::convert_to_unlit;
use crate::scene::{Camera, Node, NodeHandle, Scene};
use crate::tracking::{FrameSource, MarkerDetector, TrackingRig};
use crate::utils::{FpsCounter, FrameState, with_timeout};

/// Results of background asset loads, delivered to the loop.
#[derive(Debug)]
pub enum AssetEvent {
    /// Clips of the motion asset, not yet retargeted.
    Motion(Vec<AnimationClip>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// The frame source is not ready; ticks only reschedule.
    #[default]
    Waiting,
    /// Detecting, smoothing, animating and rendering every tick.
    Tracking,
}

/// Camera feed and detector handed to [`init`].
pub struct TrackingBackend {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn MarkerDetector>,
}

pub struct AppContext {
    config: AppConfig,
    placement: Placement,
    host: Box<dyn Host>,
    renderer: Renderer,
    scene: Scene,
    camera: NodeHandle,
    tracking: TrackingRig,
    avatar: NodeHandle,
    mixer: AnimationMixer,
    motion_events: flume::Receiver<AssetEvent>,
    stats: FpsCounter,
    state: LoopState,
}

struct SceneSetup {
    scene: Scene,
    camera: NodeHandle,
    tracking: TrackingRig,
    avatar: NodeHandle,
    motion_events: flume::Receiver<AssetEvent>,
}

// ============================================================================
// Initialization
// ============================================================================

/// Builds the application.
///
/// On failure the loading indicator is left visible and no loop should be
/// started. With no asset timeout configured, an avatar that never
/// arrives keeps this future pending.
pub async fn init<A: AssetProvider>(
    config: AppConfig,
    host: Box<dyn Host>,
    surface: Box<dyn RenderSurface>,
    backend: TrackingBackend,
    assets: Arc<A>,
) -> Result<AppContext> {
    let placement = Placement::from_query(&host.query_string());
    let viewport = host.viewport();
    log::info!("Starting viewer ({placement:?} placement, {}x{})", viewport.width, viewport.height);

    let (renderer, setup) = futures::join!(
        Renderer::init(config.renderer.clone(), viewport, surface),
        init_scene(&config, placement, viewport, backend, &assets),
    );

    let (renderer, setup) = match (renderer, setup) {
        (Ok(renderer), Ok(setup)) => (renderer, setup),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Initialization failed: {e}");
            return Err(e);
        }
    };

    let mut ctx = AppContext {
        mixer: AnimationMixer::new(setup.avatar),
        config,
        placement,
        host,
        renderer,
        scene: setup.scene,
        camera: setup.camera,
        tracking: setup.tracking,
        avatar: setup.avatar,
        motion_events: setup.motion_events,
        stats: FpsCounter::new(),
        state: LoopState::Waiting,
    };

    ctx.resize();
    ctx.sync_projection();
    ctx.host.set_loading_visible(false);
    log::info!("Initialization complete");
    Ok(ctx)
}

async fn init_scene<A: AssetProvider>(
    config: &AppConfig,
    placement: Placement,
    viewport: Viewport,
    backend: TrackingBackend,
    assets: &Arc<A>,
) -> Result<SceneSetup> {
    let mut scene = Scene::new();

    let camera = Camera::new_perspective(
        config.camera.fov_degrees,
        viewport.aspect(),
        config.camera.near,
        config.camera.far,
    );
    let camera = scene.add_camera(camera);
    scene.active_camera = Some(camera);

    let mut tracking = TrackingRig::new(
        &mut scene,
        backend.source,
        backend.detector,
        config.tracking.clone(),
        config.smoothing.clone(),
    );
    tracking.start(assets.as_ref(), config.asset_timeout()).await?;

    let avatar = load_avatar(&mut scene, tracking.marker_scene, config, placement, assets.as_ref()).await?;

    let (sender, motion_events) = flume::unbounded();
    spawn_motion_load(Arc::clone(assets), config.assets.motion.clone(), sender);

    Ok(SceneSetup {
        scene,
        camera,
        tracking,
        avatar,
        motion_events,
    })
}

/// Loads the avatar under `parent` and returns its root.
///
/// The root is a group holding the model, placed and rotated by the
/// placement policy. Every material of the model is made unlit.
async fn load_avatar<A: AssetProvider>(
    scene: &mut Scene,
    parent: NodeHandle,
    config: &AppConfig,
    placement: Placement,
    assets: &A,
) -> Result<NodeHandle> {
    let uri = config.assets.avatar.as_str();
    let prefab = with_timeout(uri, config.asset_timeout(), assets.load_model(uri)).await?;

    let root = scene.add_to_parent(Node::new(&prefab.name), parent);
    scene.instantiate(&prefab, root);

    scene.set_placement(
        root,
        Vec3::from_array(config.placement.position),
        config.placement.scale,
    );
    if let Some(node) = scene.get_node_mut(root) {
        node.transform.rotation = placement.rotation();
    }

    let replaced = convert_to_unlit(scene, root);
    log::info!(
        "Avatar '{}' loaded: {} meshes, {replaced} materials made unlit",
        prefab.name,
        prefab.mesh_count()
    );
    Ok(root)
}

fn spawn_motion_load<A: AssetProvider>(
    assets: Arc<A>,
    uri: String,
    events: flume::Sender<AssetEvent>,
) {
    execute_future(async move {
        match assets.load_animations(&uri).await {
            Ok(clips) if clips.is_empty() => {
                log::warn!("Motion '{uri}' has no animations");
            }
            Ok(clips) => {
                if events.send(AssetEvent::Motion(clips)).is_err() {
                    log::debug!("Motion '{uri}' arrived after shutdown");
                }
            }
            Err(e) => log::warn!("Failed to load motion '{uri}': {e}"),
        }
    });
}

// ============================================================================
// Loop
// ============================================================================

impl AppContext {
    /// Advances the loop by one frame.
    pub fn tick(&mut self, frame: &FrameState) -> LoopState {
        self.host.request_frame();

        if self.state == LoopState::Waiting {
            if !self.tracking.source.is_ready() {
                return self.state;
            }
            log::info!("Frame source ready");
            self.resize();
            self.state = LoopState::Tracking;
        }

        self.drain_asset_events();

        self.tracking.update(&mut self.scene, frame.time);
        self.mixer.update(frame.dt, &mut self.scene);

        self.scene.update_matrix_world();
        self.scene.update_skeletons();
        self.renderer.render(&self.scene);

        self.stats.update(frame.dt);
        self.host.update_stats(self.stats.stats());

        self.state
    }

    /// Keeps the source element, the drawing surface and the detector
    /// canvas the same size, in that order.
    pub fn resize(&mut self) {
        let viewport = self.host.viewport();
        let size = self.tracking.fit_source(viewport);
        self.renderer.resize(size);
        self.tracking.resize_detector(size);

        if let Some(camera) = self.scene.main_camera_mut() {
            camera.set_aspect(size.aspect());
        }
        log::debug!(
            "Resized to {}x{} (viewport {}x{})",
            size.width,
            size.height,
            viewport.width,
            viewport.height
        );
    }

    /// Copies the detector's calibrated projection into the main camera.
    /// The detector is calibrated before `init` returns.
    fn sync_projection(&mut self) {
        let Some(projection) = self.tracking.context.projection_matrix() else {
            return;
        };
        if let Some(camera) = self.scene.main_camera_mut()
            && !camera.is_calibrated()
        {
            camera.set_projection_matrix(projection);
            log::info!("Camera projection calibrated");
        }
    }

    fn drain_asset_events(&mut self) {
        let events: Vec<AssetEvent> = self.motion_events.try_iter().collect();
        for event in events {
            match event {
                AssetEvent::Motion(clips) => self.play_motion(clips),
            }
        }
    }

    fn play_motion(&mut self, clips: Vec<AnimationClip>) {
        if !self.scene.has_skeleton(self.avatar) {
            log::debug!("Avatar has no skeleton, motion can only drive named nodes");
        }

        for clip in clips {
            let clip = Arc::new(retarget_clip(&clip, &self.config.retarget));
            let name = clip.name.clone();
            let track_count = clip.tracks.len();

            let action = self.mixer.clip_action(&self.scene, clip);
            action.play();
            log::info!(
                "Playing '{name}' ({}/{track_count} tracks bound)",
                action.bindings.len()
            );
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Root of the avatar, carrying the placement.
    #[must_use]
    pub fn avatar(&self) -> NodeHandle {
        self.avatar
    }

    #[must_use]
    pub fn camera(&self) -> NodeHandle {
        self.camera
    }

    #[must_use]
    pub fn tracking(&self) -> &TrackingRig {
        &self.tracking
    }

    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }
}
