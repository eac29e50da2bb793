//! Classification of producer output lines.

use super::ProtocolRecord;

/// Error type for decoding a single line.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Failed to parse record: {reason}")]
    ParseError { input: String, reason: String },
}

/// One decoded output line.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A structured protocol record.
    Record(ProtocolRecord),
    /// A line that is not a JSON record.
    Text(String),
}

/// Parse a single line as a protocol record.
///
/// # Errors
///
/// Returns `DecodeError::ParseError` if the line is not a JSON record.
pub fn parse_line(line: &str) -> Result<ProtocolRecord, DecodeError> {
    serde_json::from_str(line.trim()).map_err(|e| DecodeError::ParseError {
        input: line.to_string(),
        reason: e.to_string(),
    })
}

/// Classify a complete line. Blank lines yield `None`.
#[must_use]
pub fn decode_line(line: &str) -> Option<StreamItem> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_line(trimmed) {
        Ok(record) => Some(StreamItem::Record(record)),
        Err(_) => Some(StreamItem::Text(trimmed.to_string())),
    }
}

/// Classify one raw line as split from a pipe. Invalid UTF-8 is replaced and
/// a trailing `\r` is dropped.
#[must_use]
pub fn decode_bytes(line: &[u8]) -> Option<StreamItem> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    decode_line(&String::from_utf8_lossy(line))
}
