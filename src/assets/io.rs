use std::future::Future;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{ArError, Result};

// ============================================================================
// Platform bounds
// ============================================================================

/// `Send` on native targets, no bound on wasm where futures are `!Send`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// `Sync` on native targets, no bound on wasm.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync> MaybeSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSync for T {}

// ============================================================================
// Readers
// ============================================================================

/// Byte source for assets: local files or HTTP.
pub trait AssetReader: MaybeSend + MaybeSync {
    /// Reads the resource at `uri`, relative to the reader's root.
    fn read_bytes(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + MaybeSend;
}

/// Reads assets from a directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileAssetReader {
    root_path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArError::AssetNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads assets over HTTP(S), relative to a base URL.
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    /// `url_str` may point at a file; its directory becomes the root.
    pub fn new(url_str: &str) -> Result<Self> {
        let url = url::Url::parse(url_str)?;
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            url.join("./")?
        };
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = self.root_url.join(uri)?;
        let request = ehttp::Request::get(url.as_str());
        let response = ehttp::fetch_async(request).await.map_err(ArError::HttpError)?;

        if !response.ok {
            return Err(ArError::HttpResponseError {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.bytes)
    }
}

/// Reader chosen from a source string at runtime.
#[derive(Clone)]
pub enum AssetReaderVariant {
    #[cfg(not(target_arch = "wasm32"))]
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// `http://` and `https://` sources use HTTP, anything else the file
    /// system.
    pub fn from_source(source: &str) -> Result<Self> {
        if is_http(source) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(ArError::HttpError(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`".into(),
                ))
            }
        } else {
            #[cfg(not(target_arch = "wasm32"))]
            {
                Ok(Self::File(Arc::new(FileAssetReader::new(source))))
            }
            #[cfg(target_arch = "wasm32")]
            {
                Err(ArError::WasmError(format!(
                    "'{source}' is not an HTTP URL; the browser can only fetch over HTTP"
                )))
            }
        }
    }
}

impl AssetReader for AssetReaderVariant {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}

fn is_http(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Resolves `relative` against the directory of `base`.
///
/// Absolute URLs and data URIs are returned unchanged.
#[must_use]
pub fn resolve_relative(base: &str, relative: &str) -> String {
    if is_http(relative) || relative.starts_with("data:") || relative.starts_with('/') {
        return relative.to_string();
    }
    match base.rfind('/') {
        Some(pos) => format!("{}{relative}", &base[..=pos]),
        None => relative.to_string(),
    }
}
