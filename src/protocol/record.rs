//! Status and result records emitted by the producer executable.
//!
//! Each record is one JSON object on its own line:
//!
//! ```text
//! {"msg":"done","time":"2024-05-01T10:00:00Z","level":"info","message_id":"12:0:-1:0"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator of the record that carries the message id.
pub const DONE: &str = "done";

/// One decoded protocol record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    /// Record discriminator.
    pub msg: String,
    /// RFC 3339 timestamp as emitted.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    /// Terminal failure signal.
    #[serde(default)]
    pub error: Option<String>,
    /// Terminal success signal in publish mode.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Terminal signal in test mode.
    #[serde(default)]
    pub success: Option<bool>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProtocolRecord {
    /// Create a record with only a discriminator.
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            time: None,
            level: None,
            error: None,
            message_id: None,
            success: None,
            extra: Map::new(),
        }
    }

    /// Returns true if this record reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Failure message of an error record. A blank `error` falls back to the
    /// discriminator, then to a generic message.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        let error = self.error.as_deref()?.trim();
        let reason = if !error.is_empty() {
            error
        } else if !self.msg.trim().is_empty() {
            self.msg.trim()
        } else {
            "producer reported an error"
        };
        Some(reason.to_string())
    }

    /// Returns true if this is the publish-mode completion record.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.msg == DONE
    }

    /// Parsed timestamp, if present and well formed.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Fields forwarded to observers: everything except `time`, `level` and `msg`.
    #[must_use]
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        if let Some(error) = &self.error {
            fields.insert("error".to_string(), Value::String(error.clone()));
        }
        if let Some(id) = &self.message_id {
            fields.insert("message_id".to_string(), Value::String(id.clone()));
        }
        if let Some(success) = self.success {
            fields.insert("success".to_string(), Value::Bool(success));
        }
        fields
    }
}
