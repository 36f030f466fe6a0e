//! Asset loading
//!
//! - [`io`]: byte readers for files and HTTP
//! - [`provider`]: the model/animation source the app talks to
//! - [`prefab`]: decoded, scene-independent models
//! - [`loaders`]: format decoders

pub mod io;
pub mod loaders;
pub mod prefab;
pub mod provider;

#[cfg(not(target_arch = "wasm32"))]
pub use io::FileAssetReader;
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use io::{AssetReader, AssetReaderVariant, MaybeSend, MaybeSync, resolve_relative};
pub use prefab::{ModelPrefab, PrefabNode, PrefabSkeleton};
#[cfg(feature = "gltf")]
pub use provider::GltfAssetProvider;
pub use provider::AssetProvider;
