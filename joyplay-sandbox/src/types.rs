//! Core types for sandbox execution

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request to compile and run a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    /// The source to run
    #[serde(alias = "Body")]
    pub body: String,
}

impl CompileRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Output channel an event was written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Stdout,
    Stderr,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Stdout => "stdout",
            EventKind::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discrete write captured from the running program.
///
/// `delay` is the wall-clock time since the previous event, or since process
/// start for the first one, so a client can replay output with its original
/// pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub message: String,
    pub kind: EventKind,
    #[serde(with = "delay_nanos")]
    pub delay: Duration,
}

impl Event {
    pub fn new(message: impl Into<String>, kind: EventKind, delay: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            delay,
        }
    }
}

/// Response returned to playground clients.
///
/// Exactly one of `errors` (non-empty) or `events` (possibly empty) is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompileResponse {
    pub errors: String,
    pub events: Option<Vec<Event>>,
}

impl CompileResponse {
    /// A run that completed (any exit code)
    pub fn events(events: Vec<Event>) -> Self {
        Self {
            errors: String::new(),
            events: Some(events),
        }
    }

    /// A recovered failure described to the caller
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: message.into(),
            events: None,
        }
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Request to format a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRequest {
    #[serde(alias = "Body")]
    pub body: String,

    /// Fix up the import list as well as the layout
    #[serde(default, alias = "Imports")]
    pub imports: bool,
}

/// Formatted source, or the formatter's complaint about it.
///
/// Both fields are always present on the wire; `body` is empty on error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormatResponse {
    pub body: String,
    pub error: String,
}

impl FormatResponse {
    pub fn formatted(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            error: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            body: String::new(),
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Result of running the engine in build mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Translated program text with workspace paths scrubbed
    Artifact(String),
    /// Recovered failure (validation, timeout, or build error)
    Errors(String),
}

/// Go-compatible encoding of `time.Duration` (integer nanoseconds)
mod delay_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = Event::new("hi", EventKind::Stdout, Duration::from_millis(3));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["Message"], "hi");
        assert_eq!(json["Kind"], "stdout");
        assert_eq!(json["Delay"], 3_000_000);
    }

    #[test]
    fn test_error_response_has_no_events() {
        let response = CompileResponse::error("process took too long");
        let json = serde_json::to_string(&response).unwrap();

        assert!(response.is_error());
        assert_eq!(json, r#"{"Errors":"process took too long","Events":null}"#);
    }

    #[test]
    fn test_empty_run_serializes_empty_list() {
        let response = CompileResponse::events(Vec::new());
        let json = serde_json::to_value(&response).unwrap();

        assert!(!response.is_error());
        assert_eq!(json["Events"], serde_json::json!([]));
    }

    #[test]
    fn test_request_accepts_either_casing() {
        let lower: CompileRequest = serde_json::from_str(r#"{"body":"package main"}"#).unwrap();
        let upper: CompileRequest = serde_json::from_str(r#"{"Body":"package main"}"#).unwrap();

        assert_eq!(lower.body, "package main");
        assert_eq!(upper.body, "package main");
    }

    #[test]
    fn test_format_wire_format() {
        let request: FormatRequest = serde_json::from_str(r#"{"body":"package main"}"#).unwrap();
        assert!(!request.imports);
        let request: FormatRequest =
            serde_json::from_str(r#"{"Body":"package main","Imports":true}"#).unwrap();
        assert!(request.imports);

        let json = serde_json::to_string(&FormatResponse::formatted("package main\n")).unwrap();
        assert_eq!(json, r#"{"Body":"package main\n","Error":""}"#);
        let json = serde_json::to_string(&FormatResponse::error("1:1: expected 'package'")).unwrap();
        assert_eq!(json, r#"{"Body":"","Error":"1:1: expected 'package'"}"#);
    }
}
