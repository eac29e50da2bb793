//! Message payload normalization.

use serde_json::Value;

/// Payload handed to a publish call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent verbatim.
    Text(String),
    /// Serialized to JSON text, except bare strings which are sent verbatim.
    Json(Value),
}

impl Payload {
    /// Normalize the payload to the string the producer receives.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) | Self::Json(Value::String(text)) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Normalize and escape double quotes so the token survives the
    /// producer's own argument parsing.
    #[must_use]
    pub fn to_argument(&self) -> String {
        escape_quotes(&self.to_text())
    }
}

/// Escape every double quote with a backslash.
#[must_use]
pub fn escape_quotes(text: &str) -> String {
    text.replace('"', "\\\"")
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

macro_rules! payload_from_display {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Payload {
            fn from(value: $ty) -> Self {
                Self::Text(value.to_string())
            }
        })*
    };
}

payload_from_display!(bool, i32, i64, u32, u64, f64);
