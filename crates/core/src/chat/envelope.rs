//! Message envelope and its JSON wire codec.
//!
//! The envelope is a flat JSON object with three string fields:
//!
//! ```json
//! {"sender":"user_4242","message":"hello","timestamp":"14:03:27"}
//! ```
//!
//! Unknown keys are ignored on decode so the shape can grow without breaking
//! older listeners.

use chrono::Local;
use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Format used for envelope timestamps (local wall clock, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// The unit exchanged over a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: String,
    pub message: String,
    pub timestamp: String,
}

impl Envelope {
    /// Creates an envelope stamped with the current local time.
    pub fn now(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            timestamp: current_timestamp(),
        }
    }

    /// Encodes this envelope to its wire form.
    pub fn encode(&self) -> String {
        encode(&self.sender, &self.message, &self.timestamp)
    }
}

/// Returns the current local time formatted as `HH:MM:SS`.
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Encodes the three envelope fields as a JSON object.
pub fn encode(sender: &str, message: &str, timestamp: &str) -> String {
    serde_json::json!({
        "sender": sender,
        "message": message,
        "timestamp": timestamp,
    })
    .to_string()
}

/// Decodes a wire payload into an envelope.
///
/// # Errors
///
/// Returns `DecodeError::InvalidUtf8` for non UTF-8 bytes and
/// `DecodeError::Malformed` when the payload is not a JSON object carrying
/// string `sender`, `message` and `timestamp` fields.
pub fn decode(payload: &[u8]) -> Result<Envelope, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;
    serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))
}
