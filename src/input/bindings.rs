//! The key-binding table.

use winit::keyboard::KeyCode;

use crate::error::{EngineError, Result};
use crate::input::event::Event;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyBinding {
    key: KeyCode,
    name: String,
    event: Event,
}

impl KeyBinding {
    pub fn new(key: KeyCode, name: impl Into<String>, event: Event) -> Self {
        Self {
            key,
            name: name.into(),
            event,
        }
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event(&self) -> Event {
        self.event
    }
}

/// Ordered table, unique by name. Only keys change after construction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyBindings {
    entries: Vec<KeyBinding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new([
            KeyBinding::new(KeyCode::KeyW, "up", Event::Up),
            KeyBinding::new(KeyCode::KeyA, "left", Event::Left),
            KeyBinding::new(KeyCode::KeyS, "down", Event::Down),
            KeyBinding::new(KeyCode::KeyD, "right", Event::Right),
            KeyBinding::new(KeyCode::ControlLeft, "button_one", Event::ButtonOne),
            KeyBinding::new(KeyCode::Space, "button_two", Event::ButtonTwo),
            KeyBinding::new(KeyCode::Escape, "select", Event::Select),
            KeyBinding::new(KeyCode::Enter, "start", Event::Start),
        ])
    }
}

impl KeyBindings {
    /// Later entries with an already used name replace the earlier one in place.
    pub fn new(bindings: impl IntoIterator<Item = KeyBinding>) -> Self {
        let mut entries: Vec<KeyBinding> = Vec::new();
        for binding in bindings {
            match entries.iter_mut().find(|b| b.name == binding.name) {
                Some(existing) => *existing = binding,
                None => entries.push(binding),
            }
        }
        Self { entries }
    }

    pub fn find_by_code(&self, key: KeyCode) -> Option<&KeyBinding> {
        self.entries.iter().find(|b| b.key == key)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&KeyBinding> {
        self.entries.iter().find(|b| b.name == name)
    }

    /// Points the binding called `name` at `key`, keeping its name and event.
    pub fn rebind(&mut self, name: &str, key: KeyCode) -> Result<&KeyBinding> {
        if let Some(owner) = self.find_by_code(key) {
            if owner.name != name {
                return Err(EngineError::KeyInUse {
                    key,
                    name: owner.name.clone(),
                });
            }
        }
        let binding = self
            .entries
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| EngineError::UnknownBinding(name.to_string()))?;
        binding.key = key;
        log::info!("{} rebound to {:?}", binding.name, key);
        Ok(binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_eight_unique_entries() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.len(), 8);
        let start = bindings.find_by_code(KeyCode::Enter).unwrap();
        assert_eq!(start.name(), "start");
        assert_eq!(start.event(), Event::Start);
        assert_eq!(
            bindings.find_by_name("button_one").unwrap().key(),
            KeyCode::ControlLeft
        );
    }

    #[test]
    fn rebind_only_changes_the_key() {
        let mut bindings = KeyBindings::default();
        let rebound = bindings.rebind("up", KeyCode::ArrowUp).unwrap().clone();
        assert_eq!(rebound.event(), Event::Up);
        assert_eq!(rebound.name(), "up");
        assert_eq!(bindings.len(), 8);
        assert!(bindings.find_by_code(KeyCode::KeyW).is_none());
        assert_eq!(
            bindings.find_by_code(KeyCode::ArrowUp).unwrap().event(),
            Event::Up
        );
    }

    #[test]
    fn rebinding_to_own_key_is_allowed() {
        let mut bindings = KeyBindings::default();
        assert!(bindings.rebind("left", KeyCode::KeyA).is_ok());
        assert_eq!(bindings, KeyBindings::default());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut bindings = KeyBindings::default();
        let err = bindings.rebind("jump", KeyCode::KeyJ).unwrap_err();
        assert!(matches!(err, EngineError::UnknownBinding(name) if name == "jump"));
        assert_eq!(bindings, KeyBindings::default());
    }

    #[test]
    fn key_owned_by_another_binding_is_rejected() {
        let mut bindings = KeyBindings::default();
        let err = bindings.rebind("up", KeyCode::Space).unwrap_err();
        assert!(matches!(
            err,
            EngineError::KeyInUse { key: KeyCode::Space, ref name } if name == "button_two"
        ));
        assert_eq!(bindings.find_by_name("up").unwrap().key(), KeyCode::KeyW);
    }

    #[test]
    fn duplicate_names_collapse_in_place() {
        let bindings = KeyBindings::new([
            KeyBinding::new(KeyCode::KeyW, "up", Event::Up),
            KeyBinding::new(KeyCode::KeyS, "down", Event::Down),
            KeyBinding::new(KeyCode::ArrowUp, "up", Event::Up),
        ]);
        let names: Vec<_> = bindings.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["up", "down"]);
        assert_eq!(bindings.find_by_name("up").unwrap().key(), KeyCode::ArrowUp);
    }
}
