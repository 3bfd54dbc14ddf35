use std::path::Path;

use image::GenericImageView;

use crate::{
    context::ResourceLedger,
    data_structures::texture::{BoundTexture, Texture},
    error::{EngineError, Result},
    resources::load_binary,
};

/// Images wider or taller than `max` never reach the device.
fn check_dimensions(path: &Path, size: (u32, u32), max: u32) -> Result<()> {
    if size.0 > max || size.1 > max {
        return Err(EngineError::TextureTooLarge {
            path: path.to_path_buf(),
            size,
            max,
        });
    }
    Ok(())
}

/// Reads, decodes and uploads an image, ready to be bound at group 1.
pub fn load_texture(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    ledger: &ResourceLedger,
    layout: &wgpu::BindGroupLayout,
) -> Result<BoundTexture> {
    let data = load_binary(path)?;
    let img = image::load_from_memory(&data).map_err(|source| EngineError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    check_dimensions(path, img.dimensions(), device.limits().max_texture_dimension_2d)?;

    let label = path.display().to_string();
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let texture = Texture::from_image(device, queue, ledger, &img, Some(&label));
    let bound = BoundTexture::new(device, ledger, layout, texture);
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(EngineError::TextureUpload {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    log::info!(
        "loaded texture {} ({}x{}, {} mip levels)",
        label,
        bound.texture.size.0,
        bound.texture.size.1,
        bound.texture.mip_levels
    );
    Ok(bound)
}
