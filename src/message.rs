//! Diagnostics that are reported instead of failing the document.

use std::sync::Mutex;

/// Message codes passed to [MessageSink::message]
pub mod codes {
    /// A document without pages was written
    pub const EMPTY_DOCUMENT: u32 = 1;
    /// A font could not be resolved and the fallback was used instead
    pub const FONT_FALLBACK: u32 = 2;
    /// A font could not be resolved and there is no usable fallback
    pub const FONT_NOT_FOUND: u32 = 3;
    /// A character has no representation in the font's encoding
    pub const UNMAPPABLE_CHAR: u32 = 4;
    /// A character has no glyph in the font
    pub const MISSING_GLYPH: u32 = 5;
    /// A feature was dropped because the configured version is too low
    pub const VERSION_TOO_LOW: u32 = 6;
    /// A resource was loaded but nothing on any page uses it
    pub const UNUSED_RESOURCE: u32 = 7;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Receives recoverable diagnostics. Sinks may be shared between documents that are
/// built on different threads.
pub trait MessageSink: Send + Sync {
    fn message(&self, code: u32, severity: Severity, text: &str);
}

/// Forwards every message to the `log` facade
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn message(&self, code: u32, severity: Severity, text: &str) {
        match severity {
            Severity::Info => log::info!("[{code}] {text}"),
            Severity::Warning => log::warn!("[{code}] {text}"),
            Severity::Error => log::error!("[{code}] {text}"),
        }
    }
}

/// Keeps messages in memory so callers can inspect them after the fact
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<(u32, Severity, String)>>,
}

impl CollectingSink {
    pub fn new() -> CollectingSink {
        CollectingSink::default()
    }

    pub fn messages(&self) -> Vec<(u32, Severity, String)> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn codes(&self) -> Vec<u32> {
        self.messages().into_iter().map(|(code, _, _)| code).collect()
    }
}

impl MessageSink for CollectingSink {
    fn message(&self, code: u32, severity: Severity, text: &str) {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push((code, severity, text.to_string()));
    }
}
