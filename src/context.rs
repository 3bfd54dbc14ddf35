use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use image::RgbaImage;
use winit::window::Window;

use crate::{
    config::EngineConfig,
    data_structures::texture::Texture,
    diagnostics::Diagnostics,
    error::{EngineError, InitError, Result},
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    Buffer,
    Texture,
    BindGroup,
    Pipeline,
}

/// Live GPU objects per kind plus running totals.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ResourceStats {
    pub buffers: usize,
    pub textures: usize,
    pub bind_groups: usize,
    pub pipelines: usize,
    pub created: usize,
    pub destroyed: usize,
}

impl ResourceStats {
    pub fn live(&self) -> usize {
        self.buffers + self.textures + self.bind_groups + self.pipelines
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut usize {
        match kind {
            ResourceKind::Buffer => &mut self.buffers,
            ResourceKind::Texture => &mut self.textures,
            ResourceKind::BindGroup => &mut self.bind_groups,
            ResourceKind::Pipeline => &mut self.pipelines,
        }
    }
}

/// Counts the GPU objects the engine creates. Every object is paired with an
/// [`Allocation`] that gives its slot back when dropped.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    stats: Rc<Cell<ResourceStats>>,
}

impl ResourceLedger {
    pub fn issue(&self, kind: ResourceKind) -> Allocation {
        let mut stats = self.stats.get();
        *stats.slot(kind) += 1;
        stats.created += 1;
        self.stats.set(stats);
        Allocation {
            kind,
            stats: self.stats.clone(),
        }
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats.get()
    }
}

#[derive(Debug)]
pub struct Allocation {
    kind: ResourceKind,
    stats: Rc<Cell<ResourceStats>>,
}

impl Drop for Allocation {
    fn drop(&mut self) {
        let mut stats = self.stats.get();
        let slot = stats.slot(self.kind);
        *slot = slot.saturating_sub(1);
        stats.destroyed += 1;
        self.stats.set(stats);
    }
}

/// Objects the wgpu backend holds right now, counted by wgpu itself rather
/// than by the engine.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GpuObjects {
    pub buffers: isize,
    pub textures: isize,
    pub bind_groups: isize,
    pub render_pipelines: isize,
}

impl GpuObjects {
    fn from_counters(counters: &wgpu::InternalCounters) -> Self {
        let hal = &counters.hal;
        Self {
            buffers: hal.buffers.read(),
            textures: hal.textures.read(),
            bind_groups: hal.bind_groups.read(),
            render_pipelines: hal.render_pipelines.read(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Target {
    Window {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Headless {
        texture: Texture,
    },
}

/// The colour attachment of one frame.
pub struct Frame {
    surface: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) target: Target,
    pub(crate) depth_texture: Texture,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    pub format: wgpu::TextureFormat,
    pub(crate) ledger: ResourceLedger,
    pub diagnostics: Diagnostics,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        config: &EngineConfig,
        diagnostics: Diagnostics,
    ) -> std::result::Result<Self, InitError> {
        let size = window.inner_size();
        let instance = create_instance(config);

        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = request_device(&adapter).await?;
        diagnostics.install(&device);

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour; an sRGB surface does the conversion.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(InitError::NoSurfaceFormat)?;
        let present_mode = if surface_caps.present_modes.contains(&config.present_mode) {
            config.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let ledger = ResourceLedger::default();
        let depth_texture = Texture::create_depth_texture(
            &device,
            &ledger,
            [surface_config.width, surface_config.height],
            "depth_texture",
        );

        Ok(Self {
            target: Target::Window {
                window,
                surface,
                config: surface_config,
            },
            depth_texture,
            device,
            queue,
            adapter_info: adapter.get_info(),
            format,
            ledger,
            diagnostics,
        })
    }

    /// Context without a window: frames go to an offscreen texture that can be
    /// read back with [`Context::read_pixels`].
    pub async fn headless(
        config: &EngineConfig,
        diagnostics: Diagnostics,
    ) -> std::result::Result<Self, InitError> {
        let instance = create_instance(config);
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = request_device(&adapter).await?;
        diagnostics.install(&device);

        let ledger = ResourceLedger::default();
        let size = [config.width, config.height];
        let texture = Texture::create_render_target(&device, &ledger, size, "offscreen target");
        let depth_texture = Texture::create_depth_texture(&device, &ledger, size, "depth_texture");

        Ok(Self {
            target: Target::Headless { texture },
            depth_texture,
            device,
            queue,
            adapter_info: adapter.get_info(),
            format: Texture::COLOUR_FORMAT,
            ledger,
            diagnostics,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        match &self.target {
            Target::Window { config, .. } => (config.width, config.height),
            Target::Headless { texture } => texture.size,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        match &self.target {
            Target::Window { window, .. } => Some(window),
            Target::Headless { .. } => None,
        }
    }

    pub fn stats(&self) -> ResourceStats {
        self.ledger.stats()
    }

    /// Waits for submitted work so finished staging and readback buffers are
    /// released, then reads the backend's object counters.
    pub fn gpu_objects(&self) -> Result<GpuObjects> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| EngineError::ContextLost(e.to_string()))?;
        Ok(GpuObjects::from_counters(&self.device.get_internal_counters()))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Target::Window {
            surface, config, ..
        } = &mut self.target
        {
            config.width = width;
            config.height = height;
            surface.configure(&self.device, config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                &self.ledger,
                [width, height],
                "depth_texture",
            );
        }
    }

    /// Next colour attachment, or `None` if this frame has to be skipped.
    pub fn acquire(&mut self) -> Result<Option<Frame>> {
        let (surface, config) = match &self.target {
            Target::Headless { texture } => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                return Ok(Some(Frame {
                    surface: None,
                    view,
                }));
            }
            Target::Window {
                surface, config, ..
            } => (surface, config),
        };

        match surface.get_current_texture() {
            Ok(output) => {
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Some(Frame {
                    surface: Some(output),
                    view,
                }))
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                surface.configure(&self.device, config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                Err(EngineError::ContextLost("surface out of memory".to_string()))
            }
            Err(e) => {
                log::warn!("skipping frame: {}", e);
                Ok(None)
            }
        }
    }

    pub fn present(&self, frame: Frame) {
        if let Some(window) = self.window() {
            window.pre_present_notify();
        }
        if let Some(output) = frame.surface {
            output.present();
        }
    }

    /// Copies the offscreen target back to the CPU. `None` for windowed contexts.
    pub fn read_pixels(&self) -> Result<Option<RgbaImage>> {
        let Target::Headless { texture } = &self.target else {
            return Ok(None);
        };
        let (width, height) = texture.size;
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback buffer"),
            size: (padded * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        // The mapping has to be requested before polling, otherwise the wait never ends.
        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| EngineError::ContextLost(e.to_string()))?;
        match pollster::block_on(rx.receive()) {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(EngineError::ContextLost(e.to_string())),
            None => return Err(EngineError::ContextLost("readback cancelled".to_string())),
        }

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in data.chunks(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(data);
        output_buffer.unmap();

        Ok(RgbaImage::from_raw(width, height, pixels))
    }
}

fn create_instance(config: &EngineConfig) -> wgpu::Instance {
    log::info!("wgpu setup, backends {:?}", config.backends);
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: config.backends,
        flags: config.instance_flags(),
        backend_options: wgpu::BackendOptions {
            gl: wgpu::GlBackendOptions {
                gles_minor_version: wgpu::Gles3MinorVersion::Version2,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Quads are drawn from one shared vertex buffer with a per-draw base vertex.
const REQUIRED_DOWNLEVEL: wgpu::DownlevelFlags = wgpu::DownlevelFlags::BASE_VERTEX;

fn check_downlevel(
    adapter: &str,
    flags: wgpu::DownlevelFlags,
) -> std::result::Result<(), InitError> {
    let missing = REQUIRED_DOWNLEVEL.difference(flags);
    if !missing.is_empty() {
        return Err(InitError::MissingCapabilities {
            adapter: adapter.to_string(),
            missing,
        });
    }
    Ok(())
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> std::result::Result<(wgpu::Device, wgpu::Queue), InitError> {
    let info = adapter.get_info();
    log::info!("adapter {} ({:?})", info.name, info.backend);
    check_downlevel(&info.name, adapter.get_downlevel_capabilities().flags)?;
    let device = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("quad-ngin device"),
            required_features: wgpu::Features::empty(),
            // GLES 3.x level limits, raised to whatever texture size the adapter allows.
            required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                .using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok(device)
}
