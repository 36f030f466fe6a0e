//! Headless AR viewer.
//!
//! ```text
//! ar_viewer <asset-root> <poses.json> [query] [frames] [config.json]
//! ```
//!
//! `asset-root` is a directory or an `http(s)://` URL holding the
//! calibration, pattern, avatar and motion files at the configured paths.
//! `query` is the page query string, e.g. `?stand=1`.

use std::sync::Arc;
use std::time::Duration;

use marker_avatar::app::{self, TrackingBackend, run_native};
use marker_avatar::assets::{AssetReaderVariant, GltfAssetProvider};
use marker_avatar::{
    AppConfig, HeadlessSurface, PoseRecording, ReplayDetector, ReplaySource, StaticHost, Viewport,
};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const DEFAULT_FRAMES: u64 = 600;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    rt.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let asset_root = args.next().unwrap_or_else(|| ".".to_string());
    let recording_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: ar_viewer <asset-root> <poses.json> [query] [frames] [config.json]"))?;
    let query = args.next().unwrap_or_default();
    let frames = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_FRAMES,
    };
    let config = match args.next() {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let recording = Arc::new(PoseRecording::load(&recording_path)?);
    let [width, height] = recording.frame_size;

    let assets = Arc::new(GltfAssetProvider::new(AssetReaderVariant::from_source(&asset_root)?));
    let backend = TrackingBackend {
        source: Box::new(
            ReplaySource::new(Arc::clone(&recording)).with_ready_delay(Duration::from_millis(500)),
        ),
        detector: Box::new(ReplayDetector::new(recording)),
    };

    let mut ctx = app::init(
        config,
        Box::new(StaticHost::new(&query, Viewport::new(width, height))),
        Box::new(HeadlessSurface::new()),
        backend,
        assets,
    )
    .await?;

    let state = run_native(&mut ctx, FRAME_INTERVAL, Some(frames)).await;
    log::info!(
        "Finished in {state:?} state, {} animation action(s)",
        ctx.mixer().actions().len()
    );
    Ok(())
}
