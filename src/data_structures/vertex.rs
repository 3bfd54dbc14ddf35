//! Vertex, triangle and quad value types.
//!
//! Every draw submits one quad: four vertices and the shared index list
//! [`QUAD_INDICES`], i.e. two triangles sharing the `1-3` edge.

/// Position, colour and texture coordinate; 8 floats, 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // colour
        2 => Float32x2  // tex_coords
    ];

    #[allow(clippy::too_many_arguments)]
    pub const fn new(x: f32, y: f32, z: f32, r: f32, g: f32, b: f32, tx: f32, ty: f32) -> Self {
        Self {
            position: [x, y, z],
            colour: [r, g, b],
            tex_coords: [tx, ty],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl From<[f32; 8]> for Vertex {
    fn from(v: [f32; 8]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7])
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    pub v: [Vertex; 3],
}

impl Triangle {
    pub const fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self { v: [v0, v1, v2] }
    }
}

/// The four vertices of one indexed draw.
pub type Quad = [Vertex; 4];

/// Two triangles: `0-1-3` and `1-2-3`.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 3, 1, 2, 3];

/// Corners of the whole viewport in clip space, texture space spanning `0..1`.
pub const FULLSCREEN_QUAD: Quad = [
    Vertex::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0),
    Vertex::new(1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0),
    Vertex::new(-1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    Vertex::new(-1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0),
];

/// Builds the quad for a pair of triangles.
///
/// Only the first vertex of `t2` is used: the indices reuse `t1.v[1]` and
/// `t1.v[2]` for the second triangle, so `t2` is expected to share that edge.
pub fn quad(t1: &Triangle, t2: &Triangle) -> Quad {
    [t1.v[0], t1.v[1], t1.v[2], t2.v[0]]
}
