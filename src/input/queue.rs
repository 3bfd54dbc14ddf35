//! Pending platform events and their translation through the binding table.

use std::collections::VecDeque;

use crate::error::{EngineError, Result};
use crate::input::bindings::KeyBindings;
use crate::input::event::{Event, KeyState, PlatformEvent, Polled};

#[derive(Debug, Default)]
pub struct InputQueue {
    bindings: KeyBindings,
    pending: VecDeque<PlatformEvent>,
    /// Name of the binding waiting for its new key.
    capture: Option<String>,
}

impl InputQueue {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Default::default()
        }
    }

    pub fn push(&mut self, event: PlatformEvent) {
        self.pending.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// The next key-down goes to the binding called `name` instead of being
    /// reported as input.
    pub fn arm_rebind(&mut self, name: &str) -> Result<()> {
        if self.bindings.find_by_name(name).is_none() {
            return Err(EngineError::UnknownBinding(name.to_string()));
        }
        log::info!("waiting for a key for {}", name);
        self.capture = Some(name.to_string());
        Ok(())
    }

    pub fn cancel_rebind(&mut self) -> bool {
        self.capture.take().is_some()
    }

    pub fn rebind_pending(&self) -> Option<&str> {
        self.capture.as_deref()
    }

    /// Drains at most one pending event.
    pub fn poll(&mut self) -> Option<Polled> {
        let event = self.pending.pop_front()?;
        let (code, state, repeat) = match event {
            PlatformEvent::Quit => return Some(Polled::Pressed(Event::Exit)),
            PlatformEvent::Key {
                code,
                state,
                repeat,
            } => (code, state, repeat),
        };

        if state == KeyState::Down && !repeat {
            if let Some(name) = self.capture.take() {
                return Some(match self.bindings.rebind(&name, code) {
                    Ok(binding) => Polled::Rebound {
                        event: binding.event(),
                        key: code,
                    },
                    Err(e) => {
                        log::warn!("{}", e);
                        self.capture = Some(name);
                        Polled::Unbound
                    }
                });
            }
        }

        let Some(binding) = self.bindings.find_by_code(code) else {
            return Some(Polled::Unbound);
        };
        Some(match state {
            KeyState::Down => {
                log::debug!("{} Key Down", binding.name());
                Polled::Pressed(binding.event())
            }
            KeyState::Up => {
                log::debug!("{} Key Released", binding.name());
                Polled::Released(binding.event())
            }
        })
    }
}
