//! Rendering
//!
//! The 3D pipeline itself is an external service behind [`RenderSurface`].
//! [`Renderer`] owns the surface, its settings and its current size, and
//! draws the scene through the active camera.

pub mod headless;
pub mod settings;

pub use headless::HeadlessSurface;
pub use settings::RendererSettings;

use crate::errors::Result;
use crate::scene::{Camera, Scene};

/// Size of a drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 1 for empty viewports.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Drawing surface placed over the camera feed.
pub trait RenderSurface {
    fn configure(&mut self, settings: &RendererSettings, viewport: Viewport) -> Result<()>;

    fn resize(&mut self, viewport: Viewport);

    fn size(&self) -> Viewport;

    fn render(&mut self, scene: &Scene, camera: &Camera);
}

pub struct Renderer {
    settings: RendererSettings,
    surface: Box<dyn RenderSurface>,
    frame_count: u64,
}

impl Renderer {
    /// Configures `surface` for `viewport`.
    #[allow(clippy::unused_async)]
    pub async fn init(
        settings: RendererSettings,
        viewport: Viewport,
        mut surface: Box<dyn RenderSurface>,
    ) -> Result<Self> {
        surface.configure(&settings, viewport)?;
        log::info!("Renderer ready ({}x{})", viewport.width, viewport.height);

        Ok(Self {
            settings,
            surface,
            frame_count: 0,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[must_use]
    pub fn size(&self) -> Viewport {
        self.surface.size()
    }

    pub fn resize(&mut self, size: Viewport) {
        if size == self.surface.size() {
            return;
        }
        log::debug!("Resizing surface to {}x{}", size.width, size.height);
        self.surface.resize(size);
    }

    /// Draws `scene` through its active camera. Returns `false` when the
    /// scene has no camera.
    pub fn render(&mut self, scene: &Scene) -> bool {
        let Some(camera) = scene.main_camera() else {
            return false;
        };
        self.surface.render(scene, camera);
        self.frame_count += 1;
        true
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
