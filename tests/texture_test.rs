#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn background() -> (quad_ngin::Triangle, quad_ngin::Triangle) {
    use quad_ngin::{Triangle, Vertex};

    let v0 = Vertex::new(1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0);
    let v1 = Vertex::new(1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0);
    let v2 = Vertex::new(-1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    let v3 = Vertex::new(-1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0);
    (Triangle::new(v0, v1, v2), Triangle::new(v3, v2, v1))
}

#[test]
#[cfg(feature = "integration-tests")]
fn textured_draws_allocate_nothing() -> anyhow::Result<()> {
    use cgmath::{Matrix4, SquareMatrix, Vector3};
    use common::test_utils::{headless, serial, test_config};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let fone = engine.load_texture("fone.png")?;
    let tank = engine.load_texture("tank.png")?;
    let (t1, t2) = background();

    const N: usize = 40;
    let frame = |engine: &mut quad_ngin::Engine| -> anyhow::Result<()> {
        for i in 0..N {
            let shift = Matrix4::from_translation(Vector3::new(i as f32 * 0.01, 0.0, 0.0));
            engine.draw_texture(&t1, &t2, fone, Matrix4::identity())?;
            engine.draw_texture(&t1, &t2, tank, shift)?;
        }
        engine.swap_buffers()?;
        Ok(())
    };

    frame(&mut engine)?;
    let before = engine.stats();
    let before_gpu = engine.gpu_objects()?;
    frame(&mut engine)?;
    frame(&mut engine)?;
    assert_eq!(engine.stats(), before);
    assert_eq!(engine.gpu_objects()?, before_gpu);
    assert_eq!(engine.last_frame_draws(), 2 * N);
    assert_eq!(engine.diagnostics().error_count(), 0);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn unknown_and_unloaded_handles_are_rejected() -> anyhow::Result<()> {
    use cgmath::{Matrix4, SquareMatrix};
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::EngineError;

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let (t1, t2) = background();
    let tank = engine.load_texture("tank.png")?;
    let textures = engine.stats().textures;

    engine.unload_texture(tank)?;
    assert_eq!(engine.stats().textures, textures - 1);
    assert_eq!(engine.texture_count(), 0);
    assert!(matches!(
        engine.draw_texture(&t1, &t2, tank, Matrix4::identity()),
        Err(EngineError::UnknownTexture(h)) if h == tank
    ));
    assert!(matches!(
        engine.unload_texture(tank),
        Err(EngineError::UnknownTexture(_))
    ));
    assert_eq!(engine.pending_draws(), 0);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn unreadable_images_create_no_handle() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config, write_temp};
    use quad_ngin::EngineError;

    let _gpu = serial();
    let mut engine = headless(test_config())?;

    assert!(matches!(
        engine.load_texture("missing.png"),
        Err(EngineError::ResourceNotFound { .. })
    ));
    let garbage = write_temp("garbage.png", b"definitely not a png")?;
    assert!(matches!(
        engine.load_texture(&garbage),
        Err(EngineError::ImageDecode { .. })
    ));
    assert_eq!(engine.texture_count(), 0);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn handles_are_not_reused() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let first = engine.load_texture("tank.png")?;
    engine.unload_texture(first)?;
    let second = engine.load_texture("tank.png")?;
    assert_ne!(first, second);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn loaded_textures_show_up_in_the_backend_counters() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    // Upload staging memory is only released once a submission retires it.
    engine.swap_buffers()?;
    let before = engine.gpu_objects()?;
    let tank = engine.load_texture("tank.png")?;
    let loaded = engine.gpu_objects()?;
    assert_eq!(loaded.textures, before.textures + 1);
    assert_eq!(loaded.bind_groups, before.bind_groups + 1);

    engine.unload_texture(tank)?;
    engine.swap_buffers()?;
    assert_eq!(engine.gpu_objects()?, before);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn images_over_the_device_limit_are_refused() -> anyhow::Result<()> {
    use std::io::Cursor;

    use common::test_utils::{headless, serial, test_config, write_temp};
    use quad_ngin::EngineError;

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let max = engine.limits().max_texture_dimension_2d;

    let wide = image::RgbaImage::new(max + 1, 1);
    let mut png = Cursor::new(Vec::new());
    wide.write_to(&mut png, image::ImageFormat::Png)?;
    let path = write_temp("wide.png", png.get_ref())?;

    engine.swap_buffers()?;
    let before = engine.gpu_objects()?;
    let result = engine.load_texture(&path);
    assert!(matches!(
        result,
        Err(EngineError::TextureTooLarge { size, max: limit, .. })
            if size == (max + 1, 1) && limit == max
    ));
    assert_eq!(engine.texture_count(), 0);
    assert_eq!(engine.gpu_objects()?, before);
    assert_eq!(engine.diagnostics().error_count(), 0);
    engine.destroy()?;
    Ok(())
}
