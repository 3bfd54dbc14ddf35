#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn headless_input_goes_through_bindings() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::{Event, KeyCode, PlatformEvent, Polled};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    assert_eq!(engine.poll_event(), None);

    engine.push_event(PlatformEvent::key_down(KeyCode::KeyQ));
    engine.push_event(PlatformEvent::key_down(KeyCode::KeyD));
    engine.push_event(PlatformEvent::key_up(KeyCode::KeyD));
    engine.push_event(PlatformEvent::Quit);
    assert_eq!(engine.poll_event(), Some(Polled::Unbound));
    assert_eq!(engine.poll_event(), Some(Polled::Pressed(Event::Right)));
    assert_eq!(engine.poll_event(), Some(Polled::Released(Event::Right)));
    assert_eq!(engine.poll_event(), Some(Polled::Pressed(Event::Exit)));
    assert_eq!(engine.poll_event(), None);
    engine.destroy()?;
    Ok(())
}

#[test]
#[cfg(feature = "integration-tests")]
fn rebind_captures_the_next_key() -> anyhow::Result<()> {
    use common::test_utils::{headless, serial, test_config};
    use quad_ngin::{EngineError, Event, KeyCode, PlatformEvent, Polled};

    let _gpu = serial();
    let mut engine = headless(test_config())?;
    assert!(matches!(
        engine.rebind_key("jump"),
        Err(EngineError::UnknownBinding(_))
    ));

    engine.rebind_key("up")?;
    engine.push_event(PlatformEvent::key_down(KeyCode::ArrowUp));
    engine.push_event(PlatformEvent::key_down(KeyCode::KeyW));
    engine.push_event(PlatformEvent::key_down(KeyCode::ArrowUp));
    assert_eq!(
        engine.poll_event(),
        Some(Polled::Rebound {
            event: Event::Up,
            key: KeyCode::ArrowUp
        })
    );
    assert_eq!(engine.poll_event(), Some(Polled::Unbound));
    assert_eq!(engine.poll_event(), Some(Polled::Pressed(Event::Up)));
    assert_eq!(engine.bindings().len(), 8);

    engine.rebind_key("left")?;
    assert!(engine.cancel_rebind());
    engine.destroy()?;
    Ok(())
}
