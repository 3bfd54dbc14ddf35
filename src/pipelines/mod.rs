//! Render pipelines and the shader programs built on them.

pub mod basic;
pub mod shader;
