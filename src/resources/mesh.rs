use std::sync::Arc;

use smallvec::{SmallVec, smallvec};

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// One drawable part: geometry plus the material it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

/// A mesh is one or more primitives sharing a node.
///
/// Most meshes have a single material; glTF meshes with several
/// primitives become one multi-material mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitives: SmallVec<[Primitive; 1]>,
    pub visible: bool,
    pub morph_weights: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            name: "Mesh".to_string(),
            primitives: smallvec![Primitive { geometry, material }],
            visible: true,
            morph_weights: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_primitives(name: &str, primitives: SmallVec<[Primitive; 1]>) -> Self {
        Self {
            name: name.to_string(),
            primitives,
            visible: true,
            morph_weights: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_multi_material(&self) -> bool {
        self.primitives.len() > 1
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.primitives.iter().map(|p| &p.material)
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.primitives.iter_mut().map(|p| &mut p.material)
    }
}
