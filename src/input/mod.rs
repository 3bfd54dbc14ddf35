//! Keyboard input: logical events, the binding table and the poll queue.
//!
//! Platform key events are pushed into an [`InputQueue`] (by the window pump or
//! by [`crate::engine::Engine::push_event`]) and drained one at a time. Keys
//! present in [`KeyBindings`] come out as [`Event`]s, everything else as
//! [`Polled::Unbound`].

pub mod bindings;
pub mod event;
pub mod queue;

pub use bindings::{KeyBinding, KeyBindings};
pub use event::{Event, KeyState, PlatformEvent, Polled};
pub use queue::InputQueue;
