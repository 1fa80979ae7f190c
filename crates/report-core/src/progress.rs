//! Progress events and the sink capability handed to scoring tasks

use crate::Report;
use serde::{Deserialize, Serialize};

/// Event pushed to a caller while a report is produced
///
/// A stream carries any number of `Message` events followed by exactly one
/// terminal event (`Completed` or `Error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEvent {
    Message(String),
    Completed(Box<Report>),
    Error(String),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Message(_))
    }

    /// Wire name of the event type
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "MESSAGE",
            Self::Completed(_) => "COMPLETED",
            Self::Error(_) => "ERROR",
        }
    }
}

/// Best-effort destination for human-readable status updates
///
/// Implementations must never fail the caller: transport problems are
/// logged and swallowed.
pub trait ProgressSink: Send + Sync {
    fn message(&self, text: &str);
}

/// Sink that discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn message(&self, _text: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(!ProgressEvent::Message("x".into()).is_terminal());
        assert!(ProgressEvent::Error("boom".into()).is_terminal());
        assert_eq!(ProgressEvent::Error("boom".into()).event_name(), "ERROR");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(ProgressEvent::Message("Loading".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "MESSAGE", "data": "Loading"}));
    }
}
