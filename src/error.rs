//! Error types returned by the engine.

use std::path::PathBuf;

use thiserror::Error;
use winit::keyboard::KeyCode;

use crate::data_structures::texture::TextureHandle;
use crate::pipelines::shader::ShaderStage;

/// Failures while bringing up the window and GPU context.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("cannot create the platform event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("couldn't create the main window: {0}")]
    Window(String),

    #[error("couldn't create a rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no graphics adapter satisfies the requested backends: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("couldn't create a device with the required limits: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface has no supported formats")]
    NoSurfaceFormat,

    #[error("adapter {adapter} lacks required capabilities {missing:?}")]
    MissingCapabilities {
        adapter: String,
        missing: wgpu::DownlevelFlags,
    },

    #[error("built-in {kind} program failed to build: {source}")]
    BuiltinProgram {
        kind: &'static str,
        #[source]
        source: Box<EngineError>,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine already exists")]
    AlreadyExists,

    #[error("engine not created")]
    NotCreated,

    #[error("engine handle is null")]
    NullHandle,

    #[error("engine initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("cannot read {path:?}: {source}")]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image {path:?}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path:?} is {}x{} but the device allows at most {max}x{max}", .size.0, .size.1)]
    TextureTooLarge {
        path: PathBuf,
        size: (u32, u32),
        max: u32,
    },

    #[error("texture {path:?} was rejected by the device:\n{message}")]
    TextureUpload { path: PathBuf, message: String },

    #[error("texture handles exhausted")]
    HandlesExhausted,

    #[error("{stage} shader {path:?} failed to compile:\n{message}")]
    ShaderCompile {
        stage: ShaderStage,
        path: PathBuf,
        message: String,
    },

    #[error("shader program failed to link:\n{message}")]
    ShaderLink { message: String },

    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    #[error("no key binding named {0:?}")]
    UnknownBinding(String),

    #[error("{key:?} is already bound to {name:?}")]
    KeyInUse { key: KeyCode, name: String },

    #[error("graphics context lost: {0}")]
    ContextLost(String),
}

impl EngineError {
    pub(crate) fn not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceNotFound {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
