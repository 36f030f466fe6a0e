use std::future::Future;

use crate::animation::clip::AnimationClip;
use crate::assets::io::{AssetReader, MaybeSend, MaybeSync};
use crate::assets::prefab::ModelPrefab;
use crate::errors::Result;

/// Model and animation source used by the application.
///
/// The parsing behind it is opaque to the app: it only sees decoded
/// prefabs and clips.
pub trait AssetProvider: MaybeSend + MaybeSync + 'static {
    fn read_bytes(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + MaybeSend;

    /// Loads a model (glTF, GLB or VRM).
    fn load_model(&self, uri: &str) -> impl Future<Output = Result<ModelPrefab>> + MaybeSend;

    /// Loads only the animation clips of a file.
    fn load_animations(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<Vec<AnimationClip>>> + MaybeSend;
}

/// [`AssetProvider`] backed by the glTF loader.
#[cfg(feature = "gltf")]
pub struct GltfAssetProvider<R: AssetReader> {
    reader: R,
}

#[cfg(feature = "gltf")]
impl<R: AssetReader> GltfAssetProvider<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

#[cfg(feature = "gltf")]
impl<R: AssetReader + 'static> AssetProvider for GltfAssetProvider<R> {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        self.reader.read_bytes(uri).await
    }

    async fn load_model(&self, uri: &str) -> Result<ModelPrefab> {
        let bytes = self.reader.read_bytes(uri).await?;
        crate::assets::loaders::gltf::load_prefab(&self.reader, uri, &bytes).await
    }

    async fn load_animations(&self, uri: &str) -> Result<Vec<AnimationClip>> {
        let bytes = self.reader.read_bytes(uri).await?;
        crate::assets::loaders::gltf::load_animations(&self.reader, uri, &bytes).await
    }
}
