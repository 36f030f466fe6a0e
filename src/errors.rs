//! Error Types
//!
//! This module defines the error type shared by every subsystem of the
//! viewer.
//!
//! # Overview
//!
//! [`ArError`] covers the failure modes the viewer can observe itself:
//! - Asset fetching (file, HTTP, data URIs) and timeouts
//! - Model and animation decoding
//! - Tracking backend and drawing surface setup
//!
//! Failures inside the external services (camera permission, marker
//! detection, GPU) surface through the `Tracking` and `Surface` variants
//! with whatever message the backend reports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use marker_avatar::errors::{ArError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// The main error type for the viewer.
#[derive(Error, Debug)]
pub enum ArError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The asset was fetched but its content is unusable.
    #[error("Invalid asset '{uri}': {reason}")]
    InvalidAsset {
        /// Asset location
        uri: String,
        /// What was wrong with it
        reason: String,
    },

    /// An asset fetch did not complete within the configured limit.
    #[error("Timed out after {after:?} while loading '{asset}'")]
    Timeout {
        /// Asset location
        asset: String,
        /// The limit that elapsed
        after: Duration,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // HTTP & Network Errors
    // ========================================================================
    /// HTTP transport failure (DNS, connection, CORS, ...).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status} for {url}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// The tracking backend failed to start or to calibrate.
    #[error("Tracking error: {0}")]
    TrackingError(String),

    /// The drawing surface could not be created or configured.
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// WASM-specific error.
    #[cfg(target_arch = "wasm32")]
    #[error("WASM error: {0}")]
    WasmError(String),
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for ArError {
    fn from(err: gltf::Error) -> Self {
        ArError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, ArError>`.
pub type Result<T> = std::result::Result<T, ArError>;
