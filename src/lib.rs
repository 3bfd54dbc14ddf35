//! quad-ngin
//!
//! A minimal render engine: one fixed-size window, a wgpu context, two shader
//! programs and a keyboard binding table. Games draw textured quads assembled
//! from pairs of triangles, swap buffers once per frame and poll logical input
//! events.
//!
//! High-level modules
//! - `config`: window, backend and asset settings
//! - `context`: GPU device/queue, the render target and resource accounting
//! - `data_structures`: vertices, triangles and textures
//! - `diagnostics`: structured GPU debug messages
//! - `engine`: the [`Engine`] tying everything together
//! - `input`: logical events, key bindings and the poll queue
//! - `pipelines`: shader programs and the quad render pipeline
//! - `render`: per-frame batching into persistent buffers
//! - `resources`: file loading for shaders and images
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod token;
pub mod window;

pub use config::{EngineConfig, HEIGHT, WIDTH};
pub use context::{GpuObjects, ResourceStats};
pub use data_structures::texture::TextureHandle;
pub use data_structures::vertex::{Triangle, Vertex};
pub use diagnostics::{DebugMessage, Diagnostics};
pub use engine::{Engine, destroy_engine};
pub use error::{EngineError, InitError};
pub use input::{Event, KeyBinding, KeyBindings, KeyState, PlatformEvent, Polled};
pub use logging::{LoggingConfig, init_logging};
pub use pipelines::shader::ProgramKind;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu::Color;
pub use winit::keyboard::KeyCode;
