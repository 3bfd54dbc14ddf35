//! Engine configuration.
//!
//! [`EngineConfig`] collects everything [`crate::engine::Engine`] needs before
//! the window and GPU context exist. Defaults reproduce the fixed demo setup:
//! a 1200x920 window titled "GLES3.2", alpha blending on, debug diagnostics on
//! in debug builds and assets resolved from `./assets`.

use std::path::{Path, PathBuf};

/// Default window width in physical pixels.
pub const WIDTH: u32 = 1200;
/// Default window height in physical pixels.
pub const HEIGHT: u32 = 920;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Backends wgpu may pick from. `GL` is requested as OpenGL ES 3.2.
    pub backends: wgpu::Backends,
    /// Turns on validation + debug labels and routes driver messages to the log.
    pub debug: bool,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blending for every program.
    pub alpha_blending: bool,
    pub clear_colour: wgpu::Color,
    pub present_mode: wgpu::PresentMode,
    /// Relative resource paths are resolved against this directory.
    pub asset_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "GLES3.2".to_string(),
            width: WIDTH,
            height: HEIGHT,
            backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            debug: cfg!(debug_assertions),
            alpha_blending: true,
            clear_colour: wgpu::Color::TRANSPARENT,
            present_mode: wgpu::PresentMode::Fifo,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

impl EngineConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Zero sized surfaces cannot be configured, so both sides are clamped to 1.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_alpha_blending(mut self, enabled: bool) -> Self {
        self.alpha_blending = enabled;
        self
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_present_mode(mut self, mode: wgpu::PresentMode) -> Self {
        self.present_mode = mode;
        self
    }

    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    /// Resolves `path` against [`Self::asset_dir`] unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_dir.join(path)
        }
    }

    pub(crate) fn instance_flags(&self) -> wgpu::InstanceFlags {
        if self.debug {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::empty()
        }
    }

    pub(crate) fn blend_state(&self) -> wgpu::BlendState {
        if self.alpha_blending {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        }
    }

    /// Width over height, used by callers building projection transforms.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
