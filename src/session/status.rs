use std::time::Instant;

use log::{error, info, warn};

use crate::error::Severity;

/// The single line of feedback shown at the bottom of the desk.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub message: String,
    pub severity: Severity,
    pub since: Instant,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: "Ready".to_string(),
            severity: Severity::Info,
            since: Instant::now(),
        }
    }
}

impl StatusLine {
    /// Replace the message. Every status is mirrored to the log.
    pub fn set(&mut self, message: impl Into<String>, severity: Severity) {
        self.message = message.into();
        self.severity = severity;
        self.since = Instant::now();
        match severity {
            Severity::Error => error!("status: {}", self.message),
            Severity::Warning => warn!("status: {}", self.message),
            Severity::Info | Severity::Success => info!("status: {}", self.message),
        }
    }
}
