//! glTF 2.0 / GLB / VRM loader
//!
//! Decodes a document into a [`ModelPrefab`] in a fixed order:
//! buffers, textures, materials, nodes, skins, meshes, animations.
//! Nothing here touches a scene, so the result can be built off the main
//! thread and instantiated later.

use std::sync::Arc;

use base64::Engine as _;
use glam::{Affine3A, Mat4, Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::animation::values::MorphWeightData;
use crate::assets::io::{AssetReader, resolve_relative};
use crate::assets::prefab::{ModelPrefab, PrefabNode, PrefabSkeleton};
use crate::errors::{ArError, Result};
use crate::resources::geometry::{Geometry, MorphTarget};
use crate::resources::material::{
    AlphaMode, BasicMaterial, Material, MaterialFlags, Side, StandardMaterial,
};
use crate::resources::mesh::{Mesh, Primitive};
use crate::resources::texture::{
    FilterMode, Texture, TextureHandle, TextureSampler, TextureSource, WrapMode,
};
use crate::scene::transform::Transform;

const SUPPORTED_EXTENSIONS: [&str; 1] = ["KHR_materials_unlit"];

/// Decodes a model. External buffers are fetched through `reader`,
/// relative to `uri`.
pub async fn load_prefab<R: AssetReader>(reader: &R, uri: &str, bytes: &[u8]) -> Result<ModelPrefab> {
    let gltf = parse_document(bytes, uri)?;

    let buffers = load_buffers(&gltf, reader, uri).await?;

    let mut loader = GltfLoader::new(uri, &buffers);
    let prefab = loader.load(&gltf)?;

    log::info!(
        "Loaded '{uri}': {} nodes, {} meshes, {} skins, {} animations",
        prefab.nodes.len(),
        prefab.mesh_count(),
        prefab.skeletons.len(),
        prefab.animations.len()
    );
    Ok(prefab)
}

/// Decodes only the animation clips of a file.
pub async fn load_animations<R: AssetReader>(
    reader: &R,
    uri: &str,
    bytes: &[u8],
) -> Result<Vec<AnimationClip>> {
    let gltf = parse_document(bytes, uri)?;
    let buffers = load_buffers(&gltf, reader, uri).await?;
    let clips = read_animations(&gltf, &buffers);

    log::info!("Loaded {} animation(s) from '{uri}'", clips.len());
    Ok(clips)
}

/// Parses `bytes` and rejects documents the loader cannot walk safely:
/// unsupported required extensions first, then out-of-range indices and
/// other schema violations.
fn parse_document(bytes: &[u8], uri: &str) -> Result<gltf::Gltf> {
    let gltf = gltf::Gltf::from_slice_without_validation(bytes)?;
    check_extensions(&gltf, uri)?;
    validate(&gltf, uri)?;
    Ok(gltf)
}

fn validate(gltf: &gltf::Gltf, uri: &str) -> Result<()> {
    use gltf::json::validation::Validate;

    let root = gltf.document.as_json();
    let mut problems = Vec::new();
    root.validate(root, gltf::json::Path::new, &mut |path, error| {
        problems.push(format!("{}: {error}", path()));
    });

    match problems.first() {
        None => Ok(()),
        Some(first) => Err(ArError::InvalidAsset {
            uri: uri.to_string(),
            reason: format!("{} validation error(s), first at {first}", problems.len()),
        }),
    }
}

fn check_extensions(gltf: &gltf::Gltf, uri: &str) -> Result<()> {
    if let Some(ext) = gltf
        .extensions_required()
        .find(|ext| !SUPPORTED_EXTENSIONS.contains(ext))
    {
        return Err(ArError::InvalidAsset {
            uri: uri.to_string(),
            reason: format!("required extension '{ext}' is not supported"),
        });
    }
    for ext in gltf.extensions_used() {
        if !SUPPORTED_EXTENSIONS.contains(&ext) {
            log::debug!("'{uri}' uses extension '{ext}', ignoring it");
        }
    }
    Ok(())
}

async fn load_buffers<R: AssetReader>(
    gltf: &gltf::Gltf,
    reader: &R,
    uri: &str,
) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => {
                gltf.blob.clone().ok_or_else(|| ArError::InvalidAsset {
                    uri: uri.to_string(),
                    reason: "missing GLB binary chunk".to_string(),
                })?
            }
            gltf::buffer::Source::Uri(buffer_uri) if buffer_uri.starts_with("data:") => {
                decode_data_uri(buffer_uri)?.1
            }
            gltf::buffer::Source::Uri(buffer_uri) => {
                reader.read_bytes(&resolve_relative(uri, buffer_uri)).await?
            }
        };

        if data.len() < buffer.length() {
            return Err(ArError::InvalidAsset {
                uri: uri.to_string(),
                reason: format!(
                    "buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                ),
            });
        }
        buffer_data.push(data);
    }
    Ok(buffer_data)
}

/// Splits `data:[<mime>][;base64],<payload>` into its mime type and bytes.
///
/// Only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ArError::DataUriError("missing 'data:' prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ArError::DataUriError("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ArError::DataUriError(format!("unsupported encoding in '{header}'")))?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    let mime = (!mime.is_empty()).then(|| mime.to_string());
    Ok((mime, bytes))
}

// ============================================================================
// Loader
// ============================================================================

struct GltfLoader<'a> {
    uri: &'a str,
    buffers: &'a [Vec<u8>],
    /// Keyed by (texture index, sRGB).
    textures: FxHashMap<(usize, bool), TextureHandle>,
    materials: Vec<Material>,
    default_material: Material,
}

impl<'a> GltfLoader<'a> {
    fn new(uri: &'a str, buffers: &'a [Vec<u8>]) -> Self {
        Self {
            uri,
            buffers,
            textures: FxHashMap::default(),
            materials: Vec::new(),
            default_material: Material::Standard(StandardMaterial::default()),
        }
    }

    fn load(&mut self, gltf: &gltf::Gltf) -> Result<ModelPrefab> {
        let mut prefab = ModelPrefab::new(&model_name(self.uri));

        self.load_materials(gltf)?;

        // Nodes first so that skins and children can refer to them by index.
        prefab.nodes = gltf.nodes().map(|node| create_prefab_node(&node)).collect();

        prefab.skeletons = self.load_skins(gltf);

        let meshes = gltf
            .meshes()
            .map(|mesh| self.load_mesh_primitives(&mesh))
            .collect::<Result<Vec<_>>>()?;

        for node in gltf.nodes() {
            let Some(mesh) = node.mesh() else { continue };
            let skinned = node.skin().is_some();
            let entry = &mut prefab.nodes[node.index()];
            entry.mesh = Some(self.build_mesh(&mesh, &meshes[mesh.index()], skinned));
        }

        let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
        prefab.root_indices = match scene {
            Some(scene) => scene.nodes().map(|n| n.index()).collect(),
            None => root_nodes(gltf),
        };

        prefab.animations = read_animations(gltf, self.buffers);
        Ok(prefab)
    }

    // ------------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------------

    fn texture(&mut self, texture: &gltf::Texture, srgb: bool) -> Result<TextureHandle> {
        let key = (texture.index(), srgb);
        if let Some(handle) = self.textures.get(&key) {
            return Ok(handle.clone());
        }

        let image = texture.source();
        let source = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = self.buffers.get(view.buffer().index()).ok_or_else(|| {
                    ArError::InvalidAsset {
                        uri: self.uri.to_string(),
                        reason: format!("image {} points at a missing buffer", image.index()),
                    }
                })?;
                let start = view.offset();
                let end = start + view.length();
                let bytes = buffer.get(start..end).ok_or_else(|| ArError::InvalidAsset {
                    uri: self.uri.to_string(),
                    reason: format!("image {} view is out of bounds", image.index()),
                })?;
                TextureSource::Embedded {
                    mime_type: mime_type.to_string(),
                    bytes: Arc::from(bytes),
                }
            }
            gltf::image::Source::Uri { uri, mime_type } if uri.starts_with("data:") => {
                let (data_mime, bytes) = decode_data_uri(uri)?;
                TextureSource::Embedded {
                    mime_type: mime_type
                        .map(str::to_string)
                        .or(data_mime)
                        .unwrap_or_default(),
                    bytes: Arc::from(bytes),
                }
            }
            gltf::image::Source::Uri { uri, .. } => {
                TextureSource::Uri(resolve_relative(self.uri, uri))
            }
        };

        let mut tex = Texture::new(source);
        tex.name = texture.name().or(image.name()).map(str::to_string);
        tex.sampler = convert_sampler(&texture.sampler());
        tex.srgb = srgb;

        let handle = Arc::new(tex);
        self.textures.insert(key, handle.clone());
        Ok(handle)
    }

    // ------------------------------------------------------------------------
    // Materials
    // ------------------------------------------------------------------------

    fn load_materials(&mut self, gltf: &gltf::Gltf) -> Result<()> {
        for material in gltf.materials() {
            let converted = self.convert_material(&material)?;
            self.materials.push(converted);
        }
        Ok(())
    }

    fn convert_material(&mut self, material: &gltf::Material) -> Result<Material> {
        let pbr = material.pbr_metallic_roughness();
        let color = Vec4::from_array(pbr.base_color_factor());
        let map = pbr
            .base_color_texture()
            .map(|info| self.texture(&info.texture(), true))
            .transpose()?;

        let mut converted = if material.unlit() {
            let mut basic = BasicMaterial::new(color);
            basic.map = map;
            Material::Basic(basic)
        } else {
            let mut standard = StandardMaterial::new(color);
            standard.map = map;
            standard.metalness = pbr.metallic_factor();
            standard.roughness = pbr.roughness_factor();
            standard.emissive = Vec3::from_array(material.emissive_factor());
            standard.normal_map = material
                .normal_texture()
                .map(|info| self.texture(&info.texture(), false))
                .transpose()?;
            Material::Standard(standard)
        };

        let common = converted.common_mut();
        common.name = material.name().map(str::to_string);
        if material.double_sided() {
            common.side = Side::Double;
        }
        common.set_alpha_mode(match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        });

        Ok(converted)
    }

    // ------------------------------------------------------------------------
    // Skins
    // ------------------------------------------------------------------------

    fn load_skins(&self, gltf: &gltf::Gltf) -> Vec<PrefabSkeleton> {
        gltf.skins()
            .map(|skin| {
                let bone_indices: Vec<usize> = skin.joints().map(|j| j.index()).collect();

                let reader = skin.reader(|b| self.buffers.get(b.index()).map(Vec::as_slice));
                let mut inverse_bind_matrices: Vec<Affine3A> = reader
                    .read_inverse_bind_matrices()
                    .map(|iter| {
                        iter.map(|m| Affine3A::from_mat4(Mat4::from_cols_array_2d(&m)))
                            .collect()
                    })
                    .unwrap_or_default();
                if inverse_bind_matrices.len() != bone_indices.len() {
                    if !inverse_bind_matrices.is_empty() {
                        log::warn!(
                            "Skin {} has {} inverse bind matrices for {} joints, using identity",
                            skin.index(),
                            inverse_bind_matrices.len(),
                            bone_indices.len()
                        );
                    }
                    inverse_bind_matrices = vec![Affine3A::IDENTITY; bone_indices.len()];
                }

                PrefabSkeleton {
                    name: skin
                        .name()
                        .map_or_else(|| format!("skin_{}", skin.index()), str::to_string),
                    bone_indices,
                    inverse_bind_matrices,
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Meshes
    // ------------------------------------------------------------------------

    fn load_mesh_primitives(
        &self,
        mesh: &gltf::Mesh,
    ) -> Result<Vec<(Arc<Geometry>, Option<usize>)>> {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Mesh '{}' primitive {} uses {:?}, skipping it",
                    mesh.name().unwrap_or("unnamed"),
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let geometry = self.load_primitive_geometry(&primitive)?;
            primitives.push((Arc::new(geometry), primitive.material().index()));
        }
        Ok(primitives)
    }

    fn load_primitive_geometry(&self, primitive: &gltf::Primitive) -> Result<Geometry> {
        let reader = primitive.reader(|b| self.buffers.get(b.index()).map(Vec::as_slice));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| ArError::InvalidAsset {
                uri: self.uri.to_string(),
                reason: format!("primitive {} has no POSITION attribute", primitive.index()),
            })?
            .collect();

        let mut geometry = Geometry {
            positions,
            normals: reader.read_normals().map(Iterator::collect).unwrap_or_default(),
            uvs: reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect())
                .unwrap_or_default(),
            indices: reader.read_indices().map(|i| i.into_u32().collect()),
            joints: reader
                .read_joints(0)
                .map(|j| j.into_u16().collect())
                .unwrap_or_default(),
            weights: reader
                .read_weights(0)
                .map(|w| w.into_f32().collect())
                .unwrap_or_default(),
            morph_targets: Vec::new(),
        };

        for (positions, normals, _tangents) in reader.read_morph_targets() {
            geometry.morph_targets.push(MorphTarget {
                positions: positions.map(Iterator::collect).unwrap_or_default(),
                normals: normals.map(Iterator::collect).unwrap_or_default(),
            });
        }

        Ok(geometry)
    }

    /// One mesh per node; each primitive gets its own copy of the material
    /// with the vertex feature flags its geometry needs.
    fn build_mesh(
        &self,
        mesh: &gltf::Mesh,
        primitives: &[(Arc<Geometry>, Option<usize>)],
        skinned: bool,
    ) -> Mesh {
        let primitives: SmallVec<[Primitive; 1]> = primitives
            .iter()
            .map(|(geometry, material_index)| {
                let mut material = material_index
                    .and_then(|i| self.materials.get(i))
                    .unwrap_or(&self.default_material)
                    .clone();

                let flags = material.flags_mut();
                flags.set(MaterialFlags::SKINNING, skinned && geometry.has_skin_attributes());
                flags.set(MaterialFlags::MORPH_TARGETS, geometry.has_morph_targets());
                flags.set(MaterialFlags::MORPH_NORMALS, geometry.has_morph_normals());

                Primitive {
                    geometry: geometry.clone(),
                    material,
                }
            })
            .collect();

        let name = mesh
            .name()
            .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);
        let mut built = Mesh::from_primitives(&name, primitives);

        let target_count = built
            .primitives
            .iter()
            .map(|p| p.geometry.morph_targets.len())
            .max()
            .unwrap_or(0);
        built.morph_weights = mesh.weights().map_or_else(
            || vec![0.0; target_count],
            <[f32]>::to_vec,
        );
        built
    }
}

// ============================================================================
// Nodes
// ============================================================================

fn create_prefab_node(node: &gltf::Node) -> PrefabNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    let mut transform = Transform::new();
    transform.position = Vec3::from_array(translation);
    transform.rotation = Quat::from_array(rotation);
    transform.scale = Vec3::from_array(scale);

    PrefabNode {
        name: Some(node_name(node)),
        transform,
        children_indices: node.children().map(|c| c.index()).collect(),
        mesh: None,
        skin_index: node.skin().map(|s| s.index()),
    }
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("node_{}", node.index()), str::to_string)
}

/// Nodes that are nobody's child, for documents without scenes.
fn root_nodes(gltf: &gltf::Gltf) -> Vec<usize> {
    let mut is_child = vec![false; gltf.nodes().len()];
    for node in gltf.nodes() {
        for child in node.children() {
            is_child[child.index()] = true;
        }
    }
    is_child
        .iter()
        .enumerate()
        .filter_map(|(i, &child)| (!child).then_some(i))
        .collect()
}

fn model_name(uri: &str) -> String {
    let file = uri.rsplit(['/', '\\']).next().unwrap_or(uri);
    let stem = file.split_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        "model".to_string()
    } else {
        stem.to_string()
    }
}

fn convert_sampler(sampler: &gltf::texture::Sampler) -> TextureSampler {
    use gltf::texture::{MagFilter, MinFilter, WrappingMode};

    let wrap = |mode: WrappingMode| match mode {
        WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
        WrappingMode::Repeat => WrapMode::Repeat,
    };

    let (min_filter, generate_mipmaps) = match sampler.min_filter() {
        Some(MinFilter::Nearest) => (FilterMode::Nearest, false),
        Some(MinFilter::Linear) => (FilterMode::Linear, false),
        Some(MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear) => {
            (FilterMode::Nearest, true)
        }
        Some(MinFilter::LinearMipmapNearest | MinFilter::LinearMipmapLinear) | None => {
            (FilterMode::Linear, true)
        }
    };

    TextureSampler {
        wrap_s: wrap(sampler.wrap_s()),
        wrap_t: wrap(sampler.wrap_t()),
        mag_filter: match sampler.mag_filter() {
            Some(MagFilter::Nearest) => FilterMode::Nearest,
            Some(MagFilter::Linear) | None => FilterMode::Linear,
        },
        min_filter,
        generate_mipmaps,
    }
}

// ============================================================================
// Animations
// ============================================================================

fn read_animations(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Vec<AnimationClip> {
    gltf.animations()
        .map(|animation| {
            let mut tracks = Vec::new();

            for channel in animation.channels() {
                let reader = channel.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
                let Some(inputs) = reader.read_inputs() else { continue };
                let Some(outputs) = reader.read_outputs() else { continue };
                let times: Vec<f32> = inputs.collect();

                let node_name = node_name(&channel.target().node());
                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                    gltf::animation::Interpolation::Step => InterpolationMode::Step,
                    gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
                };

                let (target, data) = match outputs {
                    gltf::animation::util::ReadOutputs::Translations(iter) => (
                        TargetPath::Translation,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::Rotations(iter) => (
                        TargetPath::Rotation,
                        TrackData::Quaternion(KeyframeTrack::new(
                            times,
                            iter.into_f32().map(Quat::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::Scales(iter) => (
                        TargetPath::Scale,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::MorphTargetWeights(iter) => {
                        let flat: Vec<f32> = iter.into_f32().collect();
                        let values_per_key = match interpolation {
                            InterpolationMode::CubicSpline => times.len() * 3,
                            _ => times.len(),
                        };
                        if values_per_key == 0 || flat.len() % values_per_key != 0 {
                            log::warn!(
                                "Animation '{}': malformed weights for '{node_name}', skipping",
                                animation.name().unwrap_or("unnamed")
                            );
                            continue;
                        }
                        let stride = flat.len() / values_per_key;
                        let values = flat
                            .chunks_exact(stride)
                            .map(MorphWeightData::from_slice)
                            .collect();
                        (
                            TargetPath::Weights,
                            TrackData::MorphWeights(KeyframeTrack::new(
                                times,
                                values,
                                interpolation,
                            )),
                        )
                    }
                };

                tracks.push(Track {
                    meta: TrackMeta { node_name, target },
                    data,
                });
            }

            let name = animation
                .name()
                .map_or_else(|| format!("animation_{}", animation.index()), str::to_string);
            AnimationClip::new(name, tracks)
        })
        .collect()
}
