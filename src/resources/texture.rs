use std::sync::Arc;

/// Shared texture reference held by materials.
///
/// Cloning a material shares the texture rather than copying it.
pub type TextureHandle = Arc<Texture>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureSampler {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub generate_mipmaps: bool,
}

/// Where the image behind a texture comes from.
///
/// Images are kept encoded; decoding is left to the drawing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Relative or absolute location, resolved by the surface.
    Uri(String),
    /// Encoded image bytes from a buffer view or data URI.
    Embedded {
        mime_type: String,
        bytes: Arc<[u8]>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: Option<String>,
    pub source: TextureSource,
    pub sampler: TextureSampler,
    /// Base colour maps are sRGB; data maps are linear.
    pub srgb: bool,
}

impl Texture {
    #[must_use]
    pub fn new(source: TextureSource) -> Self {
        Self {
            name: None,
            source,
            sampler: TextureSampler::default(),
            srgb: true,
        }
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        match &self.source {
            TextureSource::Uri(_) => 0,
            TextureSource::Embedded { bytes, .. } => bytes.len(),
        }
    }
}
