use glam::{Vec3, Vec4};

use crate::resources::material::{MaterialCommon, MaterialFlags};
use crate::resources::texture::TextureHandle;

/// Metallic-roughness material as described by glTF.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub common: MaterialCommon,
    pub color: Vec4,
    pub map: Option<TextureHandle>,
    pub emissive: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    pub normal_map: Option<TextureHandle>,
    pub flags: MaterialFlags,
}

impl StandardMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            common: MaterialCommon::default(),
            color,
            map: None,
            emissive: Vec3::ZERO,
            metalness: 1.0,
            roughness: 1.0,
            normal_map: None,
            flags: MaterialFlags::LIGHTS,
        }
    }
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
