use glam::Vec4;

use crate::resources::material::{MaterialCommon, MaterialFlags};
use crate::resources::texture::TextureHandle;

/// Unlit material: the surface shows its colour (times the map) regardless
/// of scene lighting.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    pub common: MaterialCommon,
    pub color: Vec4,
    pub map: Option<TextureHandle>,
    pub flags: MaterialFlags,
}

impl BasicMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            common: MaterialCommon::default(),
            color,
            map: None,
            flags: MaterialFlags::empty(),
        }
    }
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
