//! glTF Loader Tests
//!
//! Tests for:
//! - Document decoding into a ModelPrefab (nodes, names, roots, meshes)
//! - Materials: standard, KHR_materials_unlit, alpha and sidedness
//! - Multi-primitive meshes and the default material
//! - Buffers from data URIs and from files next to the model
//! - Animation channels and extension handling
//! - Data URI decoding and relative path resolution
#![cfg(feature = "gltf")]

use std::collections::HashMap;
use std::sync::Mutex;

use base64::Engine as _;
use glam::{Quat, Vec3, Vec4};
use serde_json::{Value, json};

use marker_avatar::animation::{TargetPath, TrackData};
use marker_avatar::assets::loaders::gltf::decode_data_uri;
use marker_avatar::assets::{AssetProvider, AssetReader, GltfAssetProvider, resolve_relative};
use marker_avatar::errors::{ArError, Result};
use marker_avatar::resources::{Material, MaterialFlags, Side, convert_to_unlit};
use marker_avatar::scene::{Node, Scene};

const EPSILON: f32 = 1e-5;
const MODEL_URI: &str = "models/avatar.vrm";

/// Reader serving files from memory and remembering what was asked for.
#[derive(Default)]
struct MemoryReader {
    files: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl AssetReader for MemoryReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(uri.to_string());
        }
        self.files
            .get(uri)
            .cloned()
            .ok_or_else(|| ArError::AssetNotFound(uri.to_string()))
    }
}

fn wave_rotation() -> Quat {
    Quat::from_rotation_x(0.5)
}

/// Triangle positions, u16 indices, two key times and two rotations.
fn buffer_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u16, 1, 2] {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    for t in [0.0f32, 1.0] {
        bytes.extend_from_slice(&t.to_le_bytes());
    }
    let q = wave_rotation();
    for v in [0.0f32, 0.0, 0.0, 1.0, q.x, q.y, q.z, q.w] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(bytes.len(), 84);
    bytes
}

fn data_uri(bytes: &[u8]) -> String {
    format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn document(buffer_uri: &str) -> Value {
    json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_materials_unlit", "VRM"],
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Root", "children": [1, 2] },
            { "name": "J_Bip_C_Hips", "mesh": 0, "translation": [0.0, 1.0, 0.0] },
            { "mesh": 1 }
        ],
        "meshes": [
            {
                "name": "Body",
                "primitives": [
                    { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 },
                    { "attributes": { "POSITION": 0 }, "material": 1 }
                ]
            },
            { "primitives": [{ "attributes": { "POSITION": 0 } }] }
        ],
        "materials": [
            {
                "name": "Skin",
                "doubleSided": true,
                "pbrMetallicRoughness": {
                    "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                    "metallicFactor": 0.25,
                    "roughnessFactor": 0.75
                }
            },
            {
                "name": "Hair",
                "alphaMode": "MASK",
                "alphaCutoff": 0.3,
                "extensions": { "KHR_materials_unlit": {} }
            }
        ],
        "animations": [{
            "name": "wave",
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "rotation" } }],
            "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC4" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 52, "byteLength": 32 }
        ],
        "buffers": [{ "uri": buffer_uri, "byteLength": 84 }]
    })
}

fn provider_with(model: &Value, extra: &[(&str, Vec<u8>)]) -> GltfAssetProvider<MemoryReader> {
    let mut files = HashMap::new();
    files.insert(MODEL_URI.to_string(), model.to_string().into_bytes());
    for (uri, bytes) in extra {
        files.insert((*uri).to_string(), bytes.clone());
    }
    GltfAssetProvider::new(MemoryReader {
        files,
        requested: Mutex::new(Vec::new()),
    })
}

fn embedded_provider() -> GltfAssetProvider<MemoryReader> {
    provider_with(&document(&data_uri(&buffer_bytes())), &[])
}

// ============================================================================
// Nodes & meshes
// ============================================================================

#[tokio::test]
async fn loads_node_hierarchy() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();

    assert_eq!(prefab.name, "avatar");
    assert_eq!(prefab.root_indices, vec![0]);

    let names: Vec<&str> = prefab.nodes.iter().map(|n| n.name.as_deref().unwrap()).collect();
    assert_eq!(names, vec!["Root", "J_Bip_C_Hips", "node_2"]);
    assert_eq!(prefab.nodes[0].children_indices, vec![1, 2]);
    assert!((prefab.nodes[1].transform.position - Vec3::Y).length() < EPSILON);
    assert!(prefab.skeletons.is_empty());
    assert_eq!(prefab.mesh_count(), 2);
}

#[tokio::test]
async fn primitives_become_one_multi_material_mesh() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();

    let body = prefab.nodes[1].mesh.as_ref().unwrap();
    assert_eq!(body.name, "Body");
    assert!(body.is_multi_material());
    assert_eq!(body.primitives.len(), 2);

    let geometry = &body.primitives[0].geometry;
    assert_eq!(geometry.vertex_count(), 3);
    assert_eq!(geometry.indices.as_deref(), Some(&[0u32, 1, 2][..]));
    assert_eq!(geometry.positions[1], [1.0, 0.0, 0.0]);
    assert!(body.primitives[1].geometry.indices.is_none());
    assert!(body.morph_weights.is_empty());
}

#[tokio::test]
async fn unnamed_mesh_uses_default_material() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();

    let mesh = prefab.nodes[2].mesh.as_ref().unwrap();
    assert_eq!(mesh.name, "mesh_1");
    let material = &mesh.primitives[0].material;
    assert!(material.is_lit());
    assert_eq!(material.color(), Vec4::ONE);
}

// ============================================================================
// Materials
// ============================================================================

#[tokio::test]
async fn standard_material_properties() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();
    let body = prefab.nodes[1].mesh.as_ref().unwrap();

    let Material::Standard(skin) = &body.primitives[0].material else {
        panic!("expected a standard material");
    };
    assert_eq!(skin.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert!((skin.metalness - 0.25).abs() < EPSILON);
    assert!((skin.roughness - 0.75).abs() < EPSILON);
    assert_eq!(skin.common.side, Side::Double);
    assert_eq!(skin.common.name.as_deref(), Some("Skin"));
    assert!(skin.flags.contains(MaterialFlags::LIGHTS));
    assert!(!skin.flags.contains(MaterialFlags::SKINNING));
}

#[tokio::test]
async fn unlit_extension_yields_basic_material() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();
    let body = prefab.nodes[1].mesh.as_ref().unwrap();

    let hair = &body.primitives[1].material;
    assert!(hair.as_basic().is_some());
    assert!(!hair.is_lit());
    assert!((hair.common().alpha_test - 0.3).abs() < EPSILON);
    assert_eq!(hair.common().side, Side::Front);
}

#[tokio::test]
async fn loaded_model_converts_to_unlit() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();

    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("avatar"));
    let root = scene.instantiate(&prefab, parent);
    assert_eq!(scene.get_node(root).unwrap().name, "Root");

    assert_eq!(convert_to_unlit(&mut scene, parent), 3);
    for (_, mesh) in &scene.meshes {
        assert!(mesh.materials().all(|m| !m.is_lit()));
    }
}

// ============================================================================
// Animations
// ============================================================================

#[tokio::test]
async fn animation_channels_become_tracks() {
    let clips = embedded_provider().load_animations(MODEL_URI).await.unwrap();

    assert_eq!(clips.len(), 1);
    let clip = &clips[0];
    assert_eq!(clip.name, "wave");
    assert!((clip.duration - 1.0).abs() < EPSILON);
    assert_eq!(clip.tracks.len(), 1);

    let track = &clip.tracks[0];
    assert_eq!(track.meta.node_name, "J_Bip_C_Hips");
    assert_eq!(track.meta.target, TargetPath::Rotation);
    let TrackData::Quaternion(keys) = &track.data else {
        panic!("expected a rotation track");
    };
    assert!(keys.values[1].angle_between(wave_rotation()) < 1e-4);
}

#[tokio::test]
async fn model_carries_its_animations() {
    let prefab = embedded_provider().load_model(MODEL_URI).await.unwrap();
    assert_eq!(prefab.animations.len(), 1);
}

// ============================================================================
// Buffers & extensions
// ============================================================================

#[tokio::test]
async fn external_buffer_is_read_next_to_model() {
    let provider = provider_with(&document("avatar.bin"), &[("models/avatar.bin", buffer_bytes())]);
    let prefab = provider.load_model(MODEL_URI).await.unwrap();
    assert_eq!(prefab.mesh_count(), 2);

    let requested = provider.reader().requested.lock().unwrap().clone();
    assert_eq!(requested, vec![MODEL_URI.to_string(), "models/avatar.bin".to_string()]);
}

#[tokio::test]
async fn missing_external_buffer_fails() {
    let provider = provider_with(&document("avatar.bin"), &[]);
    let err = provider.load_model(MODEL_URI).await.unwrap_err();
    assert!(matches!(err, ArError::AssetNotFound(uri) if uri == "models/avatar.bin"));
}

#[tokio::test]
async fn short_buffer_is_invalid() {
    let provider = provider_with(&document(&data_uri(&buffer_bytes()[..40])), &[]);
    let err = provider.load_model(MODEL_URI).await.unwrap_err();
    assert!(matches!(err, ArError::InvalidAsset { .. }));
}

#[tokio::test]
async fn unsupported_required_extension_is_rejected() {
    let mut doc = document(&data_uri(&buffer_bytes()));
    doc["extensionsUsed"] = json!(["KHR_draco_mesh_compression"]);
    doc["extensionsRequired"] = json!(["KHR_draco_mesh_compression"]);

    let err = provider_with(&doc, &[]).load_model(MODEL_URI).await.unwrap_err();
    assert!(
        matches!(&err, ArError::InvalidAsset { reason, .. } if reason.contains("KHR_draco_mesh_compression"))
    );
}

#[tokio::test]
async fn out_of_range_child_is_invalid() {
    let mut doc = document(&data_uri(&buffer_bytes()));
    doc["nodes"][0]["children"] = json!([1, 2, 9]);

    let err = provider_with(&doc, &[]).load_model(MODEL_URI).await.unwrap_err();
    assert!(
        matches!(&err, ArError::InvalidAsset { reason, .. } if reason.contains("children")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn out_of_range_channel_node_is_invalid() {
    let mut doc = document(&data_uri(&buffer_bytes()));
    doc["animations"][0]["channels"][0]["target"]["node"] = json!(42);
    let provider = provider_with(&doc, &[]);

    assert!(matches!(
        provider.load_animations(MODEL_URI).await,
        Err(ArError::InvalidAsset { .. })
    ));
    assert!(matches!(
        provider.load_model(MODEL_URI).await,
        Err(ArError::InvalidAsset { .. })
    ));
}

#[tokio::test]
async fn malformed_document_is_an_error() {
    let mut files = HashMap::new();
    files.insert(MODEL_URI.to_string(), b"{ not gltf".to_vec());
    let provider = GltfAssetProvider::new(MemoryReader {
        files,
        requested: Mutex::new(Vec::new()),
    });
    assert!(provider.load_model(MODEL_URI).await.is_err());
}

// ============================================================================
// Data URIs & paths
// ============================================================================

#[test]
fn data_uri_decodes_base64() {
    let (mime, bytes) = decode_data_uri("data:image/png;base64,AQID").unwrap();
    assert_eq!(mime.as_deref(), Some("image/png"));
    assert_eq!(bytes, vec![1, 2, 3]);

    let (mime, _) = decode_data_uri("data:;base64,AQID").unwrap();
    assert_eq!(mime, None);
}

#[test]
fn data_uri_rejects_other_forms() {
    assert!(matches!(
        decode_data_uri("data:text/plain,hello"),
        Err(ArError::DataUriError(_))
    ));
    assert!(matches!(
        decode_data_uri("data:image/png;base64"),
        Err(ArError::DataUriError(_))
    ));
    assert!(matches!(
        decode_data_uri("image/png;base64,AQID"),
        Err(ArError::DataUriError(_))
    ));
    assert!(matches!(
        decode_data_uri("data:;base64,@@@"),
        Err(ArError::Base64Error(_))
    ));
}

#[test]
fn relative_paths_resolve_against_model_directory() {
    assert_eq!(resolve_relative("models/avatar.vrm", "tex/skin.png"), "models/tex/skin.png");
    assert_eq!(resolve_relative("avatar.vrm", "avatar.bin"), "avatar.bin");
    assert_eq!(
        resolve_relative("https://cdn.example.com/a/model.gltf", "model.bin"),
        "https://cdn.example.com/a/model.bin"
    );
    assert_eq!(resolve_relative("models/a.gltf", "/abs/b.bin"), "/abs/b.bin");
    assert_eq!(
        resolve_relative("models/a.gltf", "https://x.org/b.bin"),
        "https://x.org/b.bin"
    );
}
