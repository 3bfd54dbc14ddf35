#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn broken_shader_keeps_installed_program() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config, write_temp};
    use quad_ngin::{EngineError, ProgramKind, pipelines::shader::ShaderStage};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let before = engine.program_generation(ProgramKind::Flat);

    let broken = write_temp("broken.frag.wgsl", b"@fragment fn fs_main( -> {")?;
    let err = engine
        .load_shader(ProgramKind::Flat, "shaders/flat.vert.wgsl", &broken)
        .unwrap_err();
    match err {
        EngineError::ShaderCompile { stage, path, .. } => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert_eq!(path, broken);
        }
        other => panic!("expected a compile error, got {other}"),
    }
    assert_eq!(engine.program_generation(ProgramKind::Flat), before);

    // The old program still renders.
    engine.draw_triangle();
    engine.swap_buffers()?;
    assert_eq!(engine.diagnostics().error_count(), 0);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn missing_entry_point_fails_to_link() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config, write_temp};
    use quad_ngin::{EngineError, ProgramKind};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let before = engine.program_generation(ProgramKind::Textured);

    let no_main = write_temp(
        "no_main.frag.wgsl",
        b"@fragment fn other() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
    )?;
    let err = engine
        .load_shader(ProgramKind::Textured, "shaders/textured.vert.wgsl", &no_main)
        .unwrap_err();
    assert!(matches!(err, EngineError::ShaderLink { .. }), "{err}");
    assert_eq!(engine.program_generation(ProgramKind::Textured), before);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn missing_shader_file_is_not_found() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::{EngineError, ProgramKind};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let err = engine
        .load_shader(ProgramKind::Flat, "shaders/missing.vert.wgsl", "shaders/flat.frag.wgsl")
        .unwrap_err();
    assert!(matches!(err, EngineError::ResourceNotFound { .. }));
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn reloading_a_good_shader_bumps_the_generation() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::ProgramKind;

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    let flat = engine.program_generation(ProgramKind::Flat);
    let textured = engine.program_generation(ProgramKind::Textured);
    let pipelines = engine.stats().pipelines;

    engine.load_shader(
        ProgramKind::Textured,
        "shaders/textured.vert.wgsl",
        "shaders/textured.frag.wgsl",
    )?;
    assert!(engine.program_generation(ProgramKind::Textured) > textured);
    assert_eq!(engine.program_generation(ProgramKind::Flat), flat);
    // Replaced, not added.
    assert_eq!(engine.stats().pipelines, pipelines);
    engine.destroy()?;
    Ok(())
}
