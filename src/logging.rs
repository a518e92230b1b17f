//! Outbound logging sink.
//!
//! The library never writes to the console itself. Every message goes through a
//! single `(message, level)` callback supplied by the embedding application.

use std::fmt;
use std::sync::Arc;

/// Verbosity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Outcomes the user should see (failures, suggestions, stops).
    User,
    /// Protocol traffic and lifecycle transitions.
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::User => write!(f, "user"),
            LogLevel::Debug => write!(f, "debug"),
        }
    }
}

type Sink = dyn Fn(&str, LogLevel) + Send + Sync;

/// Cloneable handle to the logging callback.
#[derive(Clone)]
pub struct Logger {
    sink: Option<Arc<Sink>>,
}

impl Logger {
    /// Wrap a callback.
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&str, LogLevel) + Send + Sync + 'static,
    {
        Logger {
            sink: Some(Arc::new(sink)),
        }
    }

    /// A logger that drops every message.
    #[must_use]
    pub fn silent() -> Self {
        Logger { sink: None }
    }

    pub fn log(&self, message: &str, level: LogLevel) {
        #[cfg(feature = "logging")]
        match level {
            LogLevel::User => ::log::info!("{message}"),
            LogLevel::Debug => ::log::debug!("{message}"),
        }

        if let Some(sink) = &self.sink {
            sink(message, level);
        }
    }

    #[inline]
    pub fn user(&self, message: &str) {
        self.log(message, LogLevel::User);
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        self.log(message, LogLevel::Debug);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

/// Collects messages in memory. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn capture() -> (Logger, Arc<parking_lot::Mutex<Vec<(String, LogLevel)>>>) {
    let messages = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let logger = Logger::new(move |msg, level| sink.lock().push((msg.to_string(), level)));
    (logger, messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_forwards_level() {
        let (logger, messages) = capture();
        logger.user("engine unavailable");
        logger.debug("To engine: uci");

        let messages = messages.lock();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ("engine unavailable".to_string(), LogLevel::User));
        assert_eq!(messages[1].1, LogLevel::Debug);
    }

    #[test]
    fn test_silent_logger_is_noop() {
        let logger = Logger::silent();
        logger.user("dropped");
        assert_eq!(format!("{logger:?}"), "Logger { attached: false }");
    }
}
