//! Append-only log of user-visible outcomes.

use tracing::info;

/// Receives one line per completed user action.
pub trait StatusSink {
    /// Appends a line.
    fn append(&mut self, line: String);
}

/// In-memory status log, mirrored to `tracing` at info level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLog {
    lines: Vec<String>,
}

impl StatusLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line so far, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Most recent line.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

impl StatusSink for StatusLog {
    fn append(&mut self, line: String) {
        info!(status = %line, "status");
        self.lines.push(line);
    }
}
