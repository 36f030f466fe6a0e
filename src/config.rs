//! Configuration & Placement Policy
//!
//! Fixed defaults for placement, tracking, smoothing and asset locations,
//! gathered in [`AppConfig`] so a deployment can override them from a JSON
//! file. The avatar's placement preset is never part of the file: it is
//! decided by the host's query string through [`Placement::from_query`].

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::animation::retarget::RetargetConfig;
use crate::errors::Result;
use crate::render::RendererSettings;
use crate::tracking::{SmoothingParams, TrackingParams};

/// Model position relative to the marker scene.
pub const MODEL_POSITION: [f32; 3] = [0.0, 0.0, 0.5];
/// Uniform model scale.
pub const MODEL_SCALE: f32 = 1.0;

/// Black border width of the marker; must match the generator's pattern ratio.
pub const PATTERN_RATIO: f32 = 0.9;
/// Upper bound on marker detections per second.
pub const MAX_DETECTION_RATE: f32 = 30.0;

pub const CAMERA_PARAMETERS_URL: &str = "assets/camera_para.dat";
pub const PATTERN_URL: &str = "assets/marker.patt";
pub const AVATAR_URL: &str = "assets/VRoid.vrm";
pub const MOTION_URL: &str = "assets/motion.gltf";

/// Query parameter selecting the upright preset.
pub const STAND_PARAM: &str = "stand";

const DEFAULT_ASSET_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Placement
// ============================================================================

/// How the avatar stands relative to the marker plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Lying in the marker plane.
    #[default]
    Flat,
    /// Standing perpendicular to the marker plane.
    Upright,
}

impl Placement {
    /// Reads the `stand` parameter from a query string or a full URL.
    ///
    /// Only the literal value `1` selects [`Placement::Upright`]; anything
    /// else, including an absent or empty parameter, is [`Placement::Flat`].
    #[must_use]
    pub fn from_query(query_or_url: &str) -> Self {
        Self::from_stand_param(query_param(query_or_url, STAND_PARAM).as_deref())
    }

    #[must_use]
    pub fn from_stand_param(value: Option<&str>) -> Self {
        match value {
            Some("1") => Self::Upright,
            _ => Self::Flat,
        }
    }

    /// Euler angles (XYZ order) of the preset.
    #[must_use]
    pub fn euler(self) -> Vec3 {
        match self {
            Self::Upright => Vec3::new(0.0, PI, 0.0),
            Self::Flat => Vec3::new(-FRAC_PI_2, PI, 0.0),
        }
    }

    /// The preset as a quaternion.
    #[must_use]
    pub fn rotation(self) -> Quat {
        let e = self.euler();
        Quat::from_rotation_x(e.x) * Quat::from_rotation_y(e.y) * Quat::from_rotation_z(e.z)
    }
}

/// Extracts the first occurrence of `name` from a query string or URL.
///
/// `+` decodes to a space and percent escapes are resolved. A parameter
/// without `=` yields an empty string.
#[must_use]
pub fn query_param(query_or_url: &str, name: &str) -> Option<String> {
    let query = match query_or_url.find('?') {
        Some(pos) => &query_or_url[pos + 1..],
        None => query_or_url,
    };
    let query = query.split('#').next().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

// ============================================================================
// AppConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub position: [f32; 3],
    pub scale: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position: MODEL_POSITION,
            scale: MODEL_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub avatar: String,
    pub motion: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            avatar: AVATAR_URL.to_string(),
            motion: MOTION_URL.to_string(),
        }
    }
}

/// Main camera defaults, used until the detector supplies its calibrated
/// projection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 1000.0,
            far: 10000.0,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub placement: PlacementConfig,
    pub tracking: TrackingParams,
    pub smoothing: SmoothingParams,
    pub assets: AssetPaths,
    pub camera: CameraConfig,
    pub renderer: RendererSettings,
    pub retarget: RetargetConfig,
    /// Limit for each fetch on the init path (calibration, pattern,
    /// avatar); `None` waits forever. The motion load is never bounded.
    pub asset_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            tracking: TrackingParams::default(),
            smoothing: SmoothingParams::default(),
            assets: AssetPaths::default(),
            camera: CameraConfig::default(),
            renderer: RendererSettings::default(),
            retarget: RetargetConfig::default(),
            asset_timeout_secs: Some(DEFAULT_ASSET_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub fn asset_timeout(&self) -> Option<std::time::Duration> {
        self.asset_timeout_secs.map(std::time::Duration::from_secs)
    }
}
