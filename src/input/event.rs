use std::fmt;

use winit::keyboard::KeyCode;

/// Logical input events. Game code only ever sees these, never key codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Event {
    Up,
    Left,
    Down,
    Right,
    ButtonOne,
    ButtonTwo,
    Select,
    Start,
    /// Also reported when the window is closed.
    Exit,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Up => "up",
            Event::Left => "left",
            Event::Down => "down",
            Event::Right => "right",
            Event::ButtonOne => "button_one",
            Event::ButtonTwo => "button_two",
            Event::Select => "select",
            Event::Start => "start",
            Event::Exit => "exit",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Down,
    Up,
}

/// Raw event coming out of the platform layer, before key bindings apply.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformEvent {
    Quit,
    Key {
        code: KeyCode,
        state: KeyState,
        /// Auto-repeat of a key that is held down.
        repeat: bool,
    },
}

impl PlatformEvent {
    pub fn key_down(code: KeyCode) -> Self {
        PlatformEvent::Key {
            code,
            state: KeyState::Down,
            repeat: false,
        }
    }

    pub fn key_up(code: KeyCode) -> Self {
        PlatformEvent::Key {
            code,
            state: KeyState::Up,
            repeat: false,
        }
    }
}

/// Result of draining one platform event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Polled {
    Pressed(Event),
    Released(Event),
    /// A key with no binding; handled, nothing to report.
    Unbound,
    /// A pending rebind captured `key` for the binding of `event`.
    Rebound { event: Event, key: KeyCode },
}

impl Polled {
    /// The logical event, if any.
    pub fn event(&self) -> Option<Event> {
        match self {
            Polled::Pressed(e) | Polled::Released(e) => Some(*e),
            Polled::Unbound | Polled::Rebound { .. } => None,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Polled::Pressed(Event::Exit))
    }
}
