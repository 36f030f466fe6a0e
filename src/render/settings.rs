//! Renderer Settings
//!
//! Options handed to the drawing surface when it is configured. The
//! defaults describe a see-through overlay for the camera feed:
//!
//! ```rust,ignore
//! use marker_avatar::render::RendererSettings;
//!
//! let settings = RendererSettings {
//!     antialias: false,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Drawing surface configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Transparent surface so the camera feed shows through.
    pub alpha: bool,
    pub antialias: bool,
    /// Logarithmic depth buffer, against z-fighting across the wide
    /// near/far range of the calibrated projection.
    pub logarithmic_depth: bool,
    /// RGBA clear colour.
    pub clear_color: [f32; 4],
    /// Encode output as sRGB.
    pub gamma_output: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            logarithmic_depth: true,
            clear_color: [1.0, 1.0, 1.0, 0.0],
            gamma_output: true,
        }
    }
}
