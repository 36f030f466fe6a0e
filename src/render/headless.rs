use crate::errors::{ArError, Result};
use crate::render::settings::RendererSettings;
use crate::render::{RenderSurface, Viewport};
use crate::scene::{Camera, Scene};

/// Surface that draws nothing.
///
/// Keeps the size and counts frames and visible meshes, which is enough
/// to drive the loop without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    size: Viewport,
    configured: bool,
    frames: u64,
    visible_meshes: usize,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Meshes that were visible in the last frame.
    #[must_use]
    pub fn visible_meshes(&self) -> usize {
        self.visible_meshes
    }
}

impl RenderSurface for HeadlessSurface {
    fn configure(&mut self, settings: &RendererSettings, viewport: Viewport) -> Result<()> {
        if viewport.is_empty() {
            return Err(ArError::SurfaceError(format!(
                "cannot create a {}x{} surface",
                viewport.width, viewport.height
            )));
        }
        log::debug!(
            "Headless surface {}x{} (alpha: {}, antialias: {})",
            viewport.width,
            viewport.height,
            settings.alpha,
            settings.antialias
        );
        self.size = viewport;
        self.configured = true;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.size = viewport;
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(&mut self, scene: &Scene, _camera: &Camera) {
        if !self.configured {
            return;
        }
        self.visible_meshes = scene
            .nodes
            .iter()
            .filter(|(handle, node)| node.mesh.is_some() && scene.is_visible_in_hierarchy(*handle))
            .count();
        self.frames += 1;
        log::trace!("Frame {}: {} visible meshes", self.frames, self.visible_meshes);
    }
}
