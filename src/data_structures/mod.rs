//! Engine data structures: vertices, triangles and textures.
//!
//! - `vertex` holds the interleaved vertex format and the quad index list
//! - `texture` contains the GPU texture wrapper, mip generation and the
//!   handle store

pub mod texture;
pub mod vertex;
