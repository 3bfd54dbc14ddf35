//! GPU textures and the handle store that owns them.
//!
//! [`Texture`] wraps a wgpu texture with its view and sampler. Image textures
//! are flipped vertically on load (texture space has its origin bottom-left),
//! carry a full mip chain built on the CPU and are sampled with nearest
//! filtering. [`TextureStore`] hands out [`TextureHandle`]s and keeps the
//! textures alive until they are unloaded or the engine goes away.

use std::collections::HashMap;

use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};

use crate::context::{Allocation, ResourceKind, ResourceLedger};
use crate::error::{EngineError, Result};

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
    pub size: (u32, u32),
    pub mip_levels: u32,
    _allocation: Allocation,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const COLOUR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Depth attachment cleared every frame alongside the colour target.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        size: [u32; 2],
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
            size: (size.width, size.height),
            mip_levels: 1,
            _allocation: ledger.issue(ResourceKind::Texture),
        }
    }

    /// Offscreen colour target for headless rendering; copyable for readback.
    pub fn create_render_target(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        size: [u32; 2],
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOUR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
            size: (size.width, size.height),
            mip_levels: 1,
            _allocation: ledger.issue(ResourceKind::Texture),
        }
    }

    /// 1x1 opaque white texture bound when a draw has no texture of its own.
    pub fn create_white(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ledger: &ResourceLedger,
    ) -> Texture {
        let pixel = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::upload(device, queue, ledger, vec![pixel], Some("default white"))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ledger: &ResourceLedger,
        img: &DynamicImage,
        label: Option<&str>,
    ) -> Self {
        let (width, height) = img.dimensions();
        log::debug!("uploading {}x{} texture {:?}", width, height, label);
        let rgba = img.flipv().to_rgba8();
        Self::upload(device, queue, ledger, mip_chain(rgba), label)
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ledger: &ResourceLedger,
        levels: Vec<RgbaImage>,
        label: Option<&str>,
    ) -> Self {
        let (width, height) = levels[0].dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, data) in levels.iter().enumerate() {
            let (w, h) = data.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_nearest_sampler(device));

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
            mip_levels: levels.len() as u32,
            _allocation: ledger.issue(ResourceKind::Texture),
        }
    }
}

pub fn create_nearest_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("nearest sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Number of levels down to 1x1 for a `width x height` base level.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Base level followed by successively halved levels, ending at 1x1.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let count = mip_level_count(base.width(), base.height());
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(base);
    for _ in 1..count {
        let prev = &levels[levels.len() - 1];
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = image::imageops::resize(prev, w, h, FilterType::Triangle);
        levels.push(next);
    }
    levels
}

/// Opaque identifier of a texture owned by the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureHandle(pub(crate) u32);

impl TextureHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// A texture together with the bind group that exposes it to the shaders.
#[derive(Debug)]
pub struct BoundTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
    _allocation: Allocation,
}

impl BoundTexture {
    pub fn new(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        layout: &wgpu::BindGroupLayout,
        texture: Texture,
    ) -> Self {
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| create_nearest_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("texture_bind_group"),
        });
        Self {
            texture,
            bind_group,
            _allocation: ledger.issue(ResourceKind::BindGroup),
        }
    }
}

/// Handle-indexed storage. Handles are never reused, so a stale handle can
/// only miss, never alias a newer texture.
#[derive(Debug)]
pub struct TextureStore<T = BoundTexture> {
    next: u32,
    entries: HashMap<TextureHandle, T>,
}

impl<T> Default for TextureStore<T> {
    fn default() -> Self {
        Self {
            next: 1,
            entries: HashMap::new(),
        }
    }
}

impl<T> TextureStore<T> {
    /// Fails with [`EngineError::HandlesExhausted`] once every id was issued.
    pub fn insert(&mut self, value: T) -> Result<TextureHandle> {
        let handle = TextureHandle(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or(EngineError::HandlesExhausted)?;
        self.entries.insert(handle, value);
        Ok(handle)
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&T> {
        self.entries.get(&handle)
    }

    pub fn remove(&mut self, handle: TextureHandle) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
