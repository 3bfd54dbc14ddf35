#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use quad_ngin::{Engine, EngineConfig, LoggingConfig, init_logging};

// Only one engine may be alive per process; tests in one binary take turns.
static GPU: Mutex<()> = Mutex::new(());

pub(crate) fn serial() -> MutexGuard<'static, ()> {
    GPU.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn assets() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

pub(crate) fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_size(64, 48)
        .with_debug(true)
        .with_asset_dir(assets())
}

pub(crate) fn headless(config: EngineConfig) -> anyhow::Result<Engine> {
    init_logging(LoggingConfig::default().with_filter("quad_ngin=debug,wgpu=warn"));
    Ok(Engine::headless(config)?)
}

/// Writes `contents` to a file unique to this test process.
pub(crate) fn write_temp(name: &str, contents: &[u8]) -> anyhow::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("quad-ngin-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

pub(crate) fn colour_to_rgba(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}
