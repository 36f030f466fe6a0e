//! Resource definitions
//!
//! CPU-side data the drawing surface consumes:
//! - Mesh: primitives (geometry + material) attached to a node
//! - Material: lit standard or unlit basic
//! - Texture: encoded image source and sampler
//! - Geometry: planar vertex attributes

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod texture;

pub use geometry::{BoundingBox, Geometry, MorphTarget};
pub use material::{
    AlphaMode, BasicMaterial, Material, MaterialCommon, MaterialFlags, Side, StandardMaterial,
    convert_to_unlit,
};
pub use mesh::{Mesh, Primitive};
pub use texture::{Texture, TextureHandle, TextureSampler, TextureSource};
