mod basic;
mod standard;
mod unlit;

pub use basic::BasicMaterial;
pub use standard::StandardMaterial;
pub use unlit::convert_to_unlit;

use bitflags::bitflags;
use glam::Vec4;

use crate::resources::texture::TextureHandle;

bitflags! {
    /// Vertex features and lighting model a material is compiled for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const SKINNING      = 1 << 0;
        const MORPH_TARGETS = 1 << 1;
        const MORPH_NORMALS = 1 << 2;
        const LIGHTS        = 1 << 3;
    }
}

impl MaterialFlags {
    /// Flags that describe the geometry rather than the shading model.
    pub const VERTEX_FEATURES: Self = Self::SKINNING
        .union(Self::MORPH_TARGETS)
        .union(Self::MORPH_NORMALS);
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask(f32),
    Blend,
}

/// Settings shared by every material kind.
#[derive(PartialEq, Clone, Debug)]
pub struct MaterialCommon {
    pub name: Option<String>,
    pub side: Side,
    pub transparent: bool,
    pub opacity: f32,
    /// Fragments with alpha below this are discarded; 0 disables the test.
    pub alpha_test: f32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub visible: bool,
}

impl Default for MaterialCommon {
    fn default() -> Self {
        Self {
            name: None,
            side: Side::Front,
            transparent: false,
            opacity: 1.0,
            alpha_test: 0.0,
            depth_test: true,
            depth_write: true,
            visible: true,
        }
    }
}

impl MaterialCommon {
    pub fn set_alpha_mode(&mut self, mode: AlphaMode) {
        match mode {
            AlphaMode::Opaque => {
                self.transparent = false;
                self.alpha_test = 0.0;
            }
            AlphaMode::Mask(cutoff) => {
                self.transparent = false;
                self.alpha_test = cutoff;
            }
            AlphaMode::Blend => {
                self.transparent = true;
                self.alpha_test = 0.0;
            }
        }
    }
}

// ============================================================================
// Material
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Lit physically-based material, as produced by the loader.
    Standard(StandardMaterial),
    /// Unlit material: colour and map only.
    Basic(BasicMaterial),
}

impl Material {
    #[must_use]
    pub fn new_standard(color: Vec4) -> Self {
        Self::Standard(StandardMaterial::new(color))
    }

    #[must_use]
    pub fn new_basic(color: Vec4) -> Self {
        Self::Basic(BasicMaterial::new(color))
    }

    #[must_use]
    pub fn common(&self) -> &MaterialCommon {
        match self {
            Self::Standard(m) => &m.common,
            Self::Basic(m) => &m.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut MaterialCommon {
        match self {
            Self::Standard(m) => &mut m.common,
            Self::Basic(m) => &mut m.common,
        }
    }

    #[must_use]
    pub fn color(&self) -> Vec4 {
        match self {
            Self::Standard(m) => m.color,
            Self::Basic(m) => m.color,
        }
    }

    #[must_use]
    pub fn map(&self) -> Option<&TextureHandle> {
        match self {
            Self::Standard(m) => m.map.as_ref(),
            Self::Basic(m) => m.map.as_ref(),
        }
    }

    #[must_use]
    pub fn flags(&self) -> MaterialFlags {
        match self {
            Self::Standard(m) => m.flags,
            Self::Basic(m) => m.flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut MaterialFlags {
        match self {
            Self::Standard(m) => &mut m.flags,
            Self::Basic(m) => &mut m.flags,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.common().name.as_deref()
    }

    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.flags().contains(MaterialFlags::LIGHTS)
    }

    pub fn as_basic(&self) -> Option<&BasicMaterial> {
        match self {
            Self::Basic(m) => Some(m),
            Self::Standard(_) => None,
        }
    }

    /// Builds the unlit replacement for this material.
    ///
    /// The result keeps the common block, colour, map and vertex feature
    /// flags and never takes part in lighting. Converting an unlit material
    /// again yields an equal material.
    #[must_use]
    pub fn to_unlit(&self) -> Material {
        let mut basic = BasicMaterial::new(self.color());
        basic.common = self.common().clone();
        basic.map = self.map().cloned();
        basic.flags = self.flags() & MaterialFlags::VERTEX_FEATURES;
        Material::Basic(basic)
    }
}

impl From<BasicMaterial> for Material {
    fn from(data: BasicMaterial) -> Self {
        Material::Basic(data)
    }
}

impl From<StandardMaterial> for Material {
    fn from(data: StandardMaterial) -> Self {
        Material::Standard(data)
    }
}
