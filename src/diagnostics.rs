use log::{error, warn};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Queue of messages produced by conversion passes, oldest first. Messages
/// stay queued until the caller drains them, so warnings from several passes
/// can be collected and reported together.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    queue: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a soft violation. The message is also logged.
    pub fn warn<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        warn!("{}", message);
        self.queue.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    /// Records a fatal error. The message is also logged.
    pub fn error<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        error!("{}", message);
        self.queue.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.queue.iter()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.queue
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Removes and returns every queued message
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.queue)
    }
}
