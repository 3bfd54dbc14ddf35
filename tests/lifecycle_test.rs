#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn only_one_engine_at_a_time() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::{Engine, EngineError, destroy_engine};

    let _gpu = serial();
    let engine = headless(test_config())?;
    assert!(matches!(
        Engine::headless(test_config()),
        Err(EngineError::AlreadyExists)
    ));
    destroy_engine(Some(engine))?;
    assert!(matches!(destroy_engine(None), Err(EngineError::NullHandle)));

    // The slot is free again after destruction, and after a plain drop.
    let again = headless(test_config())?;
    drop(again);
    let third = headless(test_config())?;
    third.destroy()?;
    Ok(())
}
