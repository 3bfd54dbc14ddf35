//! The platform window and its non-blocking event pump.
//!
//! The event loop is never handed control: [`WindowPump::pump`] runs it for a
//! single non-blocking iteration and collects whatever arrived into the input
//! queue, which is what makes `poll_event` cheap to call every frame.

use std::sync::Arc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::error::InitError;
use crate::input::{InputQueue, KeyState, PlatformEvent};

struct PumpHandler {
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    error: Option<String>,
    events: Vec<PlatformEvent>,
    resized: Option<PhysicalSize<u32>>,
}

impl ApplicationHandler for PumpHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(self.size)
            .with_resizable(false);
        match event_loop.create_window(attributes) {
            Ok(window) => {
                let size = window.inner_size();
                log::info!("window created: {}x{}", size.width, size.height);
                self.window = Some(Arc::new(window));
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.events.push(PlatformEvent::Quit),
            WindowEvent::Resized(size) => self.resized = Some(size),
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if let Some(event) =
                    translate_key(key_event.physical_key, key_event.state, key_event.repeat)
                {
                    self.events.push(event);
                }
            }
            _ => {}
        }
    }
}

/// Maps a winit key event to a platform event. Keys without a code are dropped.
pub fn translate_key(key: PhysicalKey, state: ElementState, repeat: bool) -> Option<PlatformEvent> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let state = match state {
        ElementState::Pressed => KeyState::Down,
        ElementState::Released => KeyState::Up,
    };
    Some(PlatformEvent::Key {
        code,
        state,
        repeat,
    })
}

pub struct WindowPump {
    event_loop: EventLoop<()>,
    handler: PumpHandler,
    exited: bool,
}

impl WindowPump {
    /// Creates the event loop and pumps it until the window exists.
    pub fn open(config: &EngineConfig) -> Result<(Self, Arc<Window>), InitError> {
        let event_loop = EventLoop::new()?;
        let mut pump = Self {
            event_loop,
            handler: PumpHandler {
                title: config.title.clone(),
                size: PhysicalSize::new(config.width, config.height),
                window: None,
                error: None,
                events: Vec::new(),
                resized: None,
            },
            exited: false,
        };

        // Some platforms only deliver `resumed` after a few iterations.
        for _ in 0..100 {
            let status = pump
                .event_loop
                .pump_app_events(Some(Duration::from_millis(10)), &mut pump.handler);
            if let Some(error) = pump.handler.error.take() {
                return Err(InitError::Window(error));
            }
            if let Some(window) = pump.handler.window.clone() {
                return Ok((pump, window));
            }
            if let PumpStatus::Exit(code) = status {
                return Err(InitError::Window(format!(
                    "event loop exited with {} before the window opened",
                    code
                )));
            }
        }
        Err(InitError::Window("window was never created".to_string()))
    }

    /// One non-blocking iteration; new events are appended to `input`.
    pub fn pump(&mut self, input: &mut InputQueue) {
        if !self.exited {
            let status = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.handler);
            if let PumpStatus::Exit(_) = status {
                self.exited = true;
                self.handler.events.push(PlatformEvent::Quit);
            }
        }
        for event in self.handler.events.drain(..) {
            input.push(event);
        }
    }

    pub fn take_resize(&mut self) -> Option<PhysicalSize<u32>> {
        self.handler.resized.take()
    }
}
