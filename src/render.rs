//! Frame batching and encoding.
//!
//! Draw calls only append to a [`FrameBatch`]: four vertices, one [`Globals`]
//! block and a [`DrawCmd`]. At swap time [`FrameRenderer`] uploads the batch
//! into buffers that live as long as the engine (grown geometrically when a
//! frame needs more room) and records one render pass. Steady frame loops
//! therefore create no GPU objects at all.
//!
//! Every draw is `draw_indexed(0..6, base_vertex, 0..1)` over the shared quad
//! index buffer, with its uniform slot selected by a dynamic offset.

use std::f32::consts::PI;
use std::time::Duration;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    context::{Allocation, Context, ResourceKind, ResourceLedger},
    data_structures::{
        texture::{BoundTexture, TextureHandle, TextureStore},
        vertex::{QUAD_INDICES, Quad, Vertex},
    },
    pipelines::{
        basic::Layouts,
        shader::{ProgramKind, Programs},
    },
};

/// Per-draw uniform block (`transform`, `resolution`, `time`), 80 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub transform: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    _padding: f32,
}

impl Globals {
    pub fn new(transform: Matrix4<f32>, resolution: (u32, u32), time: f32) -> Self {
        Self {
            transform: transform.into(),
            resolution: [resolution.0 as f32, resolution.1 as f32],
            time,
            _padding: 0.0,
        }
    }

    pub fn identity(resolution: (u32, u32), time: f32) -> Self {
        Self::new(Matrix4::identity(), resolution, time)
    }
}

/// Animation clock: advances in steps of `PI / 8` every 100 ms.
pub fn animation_time(elapsed: Duration) -> f32 {
    let steps = (elapsed.as_millis() / 100) as f32;
    PI * steps / 8.0
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCmd {
    pub program: ProgramKind,
    /// `None` binds the 1x1 white default texture.
    pub texture: Option<TextureHandle>,
    pub base_vertex: i32,
}

#[derive(Debug, Default)]
pub struct FrameBatch {
    vertices: Vec<Vertex>,
    globals: Vec<Globals>,
    draws: Vec<DrawCmd>,
}

impl FrameBatch {
    pub fn push(
        &mut self,
        quad: Quad,
        globals: Globals,
        program: ProgramKind,
        texture: Option<TextureHandle>,
    ) {
        let base_vertex = self.vertices.len() as i32;
        self.vertices.extend_from_slice(&quad);
        self.globals.push(globals);
        self.draws.push(DrawCmd {
            program,
            texture,
            base_vertex,
        });
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn globals(&self) -> &[Globals] {
        &self.globals
    }

    pub fn draws(&self) -> &[DrawCmd] {
        &self.draws
    }

    /// Empties the batch but keeps its allocations for the next frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.globals.clear();
        self.draws.clear();
    }
}

pub(crate) fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// New capacity for a buffer holding `current` bytes that must hold `needed`.
pub(crate) fn grown_capacity(current: u64, needed: u64) -> u64 {
    if needed <= current {
        current
    } else {
        needed.next_power_of_two().max(current * 2)
    }
}

#[derive(Debug)]
struct GrowableBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
    _allocation: Allocation,
}

impl GrowableBuffer {
    fn new(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            usage,
            label,
            _allocation: ledger.issue(ResourceKind::Buffer),
        }
    }

    /// Reallocates when `needed` bytes do not fit; returns whether it did.
    fn ensure(&mut self, device: &wgpu::Device, ledger: &ResourceLedger, needed: u64) -> bool {
        if needed <= self.capacity {
            return false;
        }
        let capacity = grown_capacity(self.capacity, needed);
        log::debug!("growing {} from {} to {} bytes", self.label, self.capacity, capacity);
        *self = Self::new(device, ledger, self.label, self.usage, capacity);
        true
    }
}

const INITIAL_DRAWS: u64 = 64;

pub struct FrameRenderer {
    batch: FrameBatch,
    vertices: GrowableBuffer,
    uniforms: GrowableBuffer,
    uniform_stride: u64,
    staging: Vec<u8>,
    indices: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    _index_allocation: Allocation,
    _bind_group_allocation: Allocation,
    last_frame_draws: usize,
}

impl FrameRenderer {
    pub fn new(ctx: &Context, layouts: &Layouts) -> Self {
        let device = &ctx.device;
        let ledger = &ctx.ledger;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = align_to(std::mem::size_of::<Globals>() as u64, alignment);

        let vertices = GrowableBuffer::new(
            device,
            ledger,
            "Vertex Buffer",
            wgpu::BufferUsages::VERTEX,
            INITIAL_DRAWS * std::mem::size_of::<Quad>() as u64,
        );
        let uniforms = GrowableBuffer::new(
            device,
            ledger,
            "Globals Buffer",
            wgpu::BufferUsages::UNIFORM,
            INITIAL_DRAWS * uniform_stride,
        );
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let globals_bind_group = globals_bind_group(device, layouts, &uniforms.buffer);

        Self {
            batch: FrameBatch::default(),
            vertices,
            uniforms,
            uniform_stride,
            staging: Vec::new(),
            indices,
            globals_bind_group,
            _index_allocation: ledger.issue(ResourceKind::Buffer),
            _bind_group_allocation: ledger.issue(ResourceKind::BindGroup),
            last_frame_draws: 0,
        }
    }

    pub fn batch(&self) -> &FrameBatch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut FrameBatch {
        &mut self.batch
    }

    /// Draws submitted by the most recent [`FrameRenderer::encode`].
    pub fn last_frame_draws(&self) -> usize {
        self.last_frame_draws
    }

    fn upload(&mut self, ctx: &Context, layouts: &Layouts) {
        let device = &ctx.device;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(self.batch.vertices());
        self.vertices
            .ensure(device, &ctx.ledger, vertex_bytes.len() as u64);

        let stride = self.uniform_stride as usize;
        self.staging.clear();
        self.staging.resize(stride * self.batch.globals().len(), 0);
        for (slot, globals) in self.staging.chunks_mut(stride).zip(self.batch.globals()) {
            let bytes = bytemuck::bytes_of(globals);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        if self
            .uniforms
            .ensure(device, &ctx.ledger, self.staging.len() as u64)
        {
            // The old bind group points at the dropped buffer.
            self.globals_bind_group = globals_bind_group(device, layouts, &self.uniforms.buffer);
        }

        ctx.queue.write_buffer(&self.vertices.buffer, 0, vertex_bytes);
        ctx.queue.write_buffer(&self.uniforms.buffer, 0, &self.staging);
    }

    /// Records the batched draws into one render pass that starts by clearing
    /// the target, then empties the batch.
    pub fn encode(
        &mut self,
        ctx: &Context,
        view: &wgpu::TextureView,
        layouts: &Layouts,
        programs: &Programs,
        textures: &TextureStore,
        default_texture: &BoundTexture,
        clear_colour: wgpu::Color,
    ) -> wgpu::CommandBuffer {
        if !self.batch.is_empty() {
            self.upload(ctx, layouts);
        }

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !self.batch.is_empty() {
                render_pass.set_vertex_buffer(0, self.vertices.buffer.slice(..));
                render_pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
            }

            let mut bound: Option<ProgramKind> = None;
            for (slot, draw) in self.batch.draws().iter().enumerate() {
                if draw.program == ProgramKind::Textured {
                    let texture = match draw.texture {
                        Some(handle) => match textures.get(handle) {
                            Some(texture) => texture,
                            None => {
                                log::warn!("skipping draw with unloaded texture {:?}", handle);
                                continue;
                            }
                        },
                        None => default_texture,
                    };
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                if bound != Some(draw.program) {
                    render_pass.set_pipeline(&programs.get(draw.program).pipeline);
                    bound = Some(draw.program);
                }
                let offset = (slot as u64 * self.uniform_stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(0, &self.globals_bind_group, &[offset]);
                render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, draw.base_vertex, 0..1);
            }
        }

        self.last_frame_draws = self.batch.len();
        self.batch.clear();
        encoder.finish()
    }
}

fn globals_bind_group(
    device: &wgpu::Device,
    layouts: &Layouts,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &layouts.globals,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<Globals>() as u64),
            }),
        }],
        label: Some("globals_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::vertex::FULLSCREEN_QUAD;

    #[test]
    fn globals_block_matches_the_wgsl_layout() {
        assert_eq!(std::mem::size_of::<Globals>(), 80);
        let globals = Globals::identity((1200, 920), 0.5);
        assert_eq!(globals.resolution, [1200.0, 920.0]);
        assert_eq!(globals.transform[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn transform_is_stored_column_major() {
        let translate = Matrix4::from_translation(Vector3::new(0.25, -0.5, 0.0));
        let globals = Globals::new(translate, (1, 1), 0.0);
        assert_eq!(globals.transform[3], [0.25, -0.5, 0.0, 1.0]);
    }

    #[test]
    fn animation_time_steps_every_100ms() {
        assert_eq!(animation_time(Duration::from_millis(0)), 0.0);
        assert_eq!(animation_time(Duration::from_millis(99)), 0.0);
        assert_eq!(animation_time(Duration::from_millis(100)), PI / 8.0);
        assert_eq!(animation_time(Duration::from_millis(1650)), PI * 16.0 / 8.0);
    }

    #[test]
    fn batch_offsets_each_quad_by_four_vertices() {
        let mut batch = FrameBatch::default();
        let globals = Globals::identity((4, 4), 0.0);
        batch.push(FULLSCREEN_QUAD, globals, ProgramKind::Flat, None);
        batch.push(FULLSCREEN_QUAD, globals, ProgramKind::Textured, None);
        batch.push(
            FULLSCREEN_QUAD,
            globals,
            ProgramKind::Textured,
            Some(TextureHandle(3)),
        );
        let bases: Vec<_> = batch.draws().iter().map(|d| d.base_vertex).collect();
        assert_eq!(bases, vec![0, 4, 8]);
        assert_eq!(batch.vertices().len(), 12);
        assert_eq!(batch.globals().len(), 3);

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn capacity_grows_geometrically() {
        assert_eq!(grown_capacity(2048, 1000), 2048);
        assert_eq!(grown_capacity(2048, 2049), 4096);
        assert_eq!(grown_capacity(2048, 9000), 16384);
        assert_eq!(grown_capacity(256, 300), 512);
    }

    #[test]
    fn uniform_slots_respect_offset_alignment() {
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(80, 64), 128);
    }
}
