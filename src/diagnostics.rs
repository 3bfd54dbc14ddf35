//! Structured graphics diagnostics.
//!
//! Validation and driver messages are turned into [`DebugMessage`]s, written to
//! the log (stderr through `env_logger`) and kept in a bounded buffer so callers
//! can tell whether a frame loop produced unrecovered errors. They are never
//! returned as errors from draw calls.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Source {
    Api,
    ShaderCompiler,
    WindowSystem,
    ThirdParty,
    Application,
    Other,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Api => "API",
            Source::ShaderCompiler => "SHADER_COMPILER",
            Source::WindowSystem => "WINDOW_SYSTEM",
            Source::ThirdParty => "THIRD_PARTY",
            Source::Application => "APPLICATION",
            Source::Other => "OTHER",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MessageType {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Performance,
    Portability,
    Marker,
    Other,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Error => "ERROR",
            MessageType::DeprecatedBehavior => "DEPRECATED_BEHAVIOR",
            MessageType::UndefinedBehavior => "UNDEFINED_BEHAVIOR",
            MessageType::Performance => "PERFORMANCE",
            MessageType::Portability => "PORTABILITY",
            MessageType::Marker => "MARKER",
            MessageType::Other => "OTHER",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Notification,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Notification => "NOTIFICATION",
        }
    }

    fn level(&self) -> log::Level {
        match self {
            Severity::High => log::Level::Error,
            Severity::Medium => log::Level::Warn,
            Severity::Low => log::Level::Info,
            Severity::Notification => log::Level::Debug,
        }
    }
}

/// One message from the graphics layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugMessage {
    pub source: Source,
    pub kind: MessageType,
    pub id: u32,
    pub severity: Severity,
    pub text: String,
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.source.as_str(),
            self.kind.as_str(),
            self.id,
            self.severity.as_str(),
            self.text.trim_end()
        )
    }
}

impl DebugMessage {
    /// Classifies a wgpu error that escaped every error scope.
    pub fn from_wgpu(error: &wgpu::Error, id: u32) -> Self {
        let (source, severity) = match error {
            wgpu::Error::OutOfMemory { .. } => (Source::Api, Severity::High),
            wgpu::Error::Validation { description, .. } => {
                if description.contains("Shader") || description.contains("shader") {
                    (Source::ShaderCompiler, Severity::High)
                } else {
                    (Source::Api, Severity::High)
                }
            }
            #[allow(unreachable_patterns)]
            _ => (Source::ThirdParty, Severity::High),
        };
        Self {
            source,
            kind: MessageType::Error,
            id,
            severity,
            text: error.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageType::Error
    }
}

const RETAINED: usize = 64;

#[derive(Debug, Default)]
struct Inner {
    next_id: u32,
    errors: usize,
    recent: VecDeque<DebugMessage>,
}

/// Shared sink; cloned into the wgpu uncaptured-error callback.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<Inner>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, message: DebugMessage) {
        log::log!(message.severity.level(), "{}", message);
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if message.is_error() {
            inner.errors += 1;
        }
        if inner.recent.len() == RETAINED {
            inner.recent.pop_front();
        }
        inner.recent.push_back(message);
    }

    pub fn report_wgpu(&self, error: &wgpu::Error) {
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                inner.next_id += 1;
                inner.next_id
            }
            Err(_) => 0,
        };
        self.report(DebugMessage::from_wgpu(error, id));
    }

    /// Errors reported since creation (not bounded by the retained window).
    pub fn error_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.errors).unwrap_or(0)
    }

    pub fn recent(&self) -> Vec<DebugMessage> {
        self.inner
            .lock()
            .map(|inner| inner.recent.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn install(&self, device: &wgpu::Device) {
        let sink = self.clone();
        device.on_uncaptured_error(Box::new(move |error| sink.report_wgpu(&error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: MessageType, text: &str) -> DebugMessage {
        DebugMessage {
            source: Source::Api,
            kind,
            id: 7,
            severity: Severity::Medium,
            text: text.to_string(),
        }
    }

    #[test]
    fn formats_like_the_driver_callback() {
        let msg = message(MessageType::Performance, "buffer re-specified\n");
        assert_eq!(msg.to_string(), "API PERFORMANCE 7 MEDIUM buffer re-specified");
    }

    #[test]
    fn only_error_messages_are_counted() {
        let diagnostics = Diagnostics::new();
        diagnostics.report(message(MessageType::Portability, "hint"));
        diagnostics.report(message(MessageType::Error, "bad"));
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.recent().len(), 2);
    }

    #[test]
    fn retained_messages_are_bounded() {
        let diagnostics = Diagnostics::new();
        for i in 0..(RETAINED + 10) {
            diagnostics.report(message(MessageType::Error, &format!("e{i}")));
        }
        let recent = diagnostics.recent();
        assert_eq!(recent.len(), RETAINED);
        assert_eq!(recent[0].text, "e10");
        assert_eq!(diagnostics.error_count(), RETAINED + 10);
    }

    #[test]
    fn clones_share_one_sink() {
        let diagnostics = Diagnostics::new();
        let callback_side = diagnostics.clone();
        callback_side.report(message(MessageType::Error, "from callback"));
        assert_eq!(diagnostics.error_count(), 1);
    }
}
