use thiserror::Error;

/// Errors that can occur when decoding an inbound envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("Malformed envelope: {0}")]
    Malformed(String),
}

/// Errors that can occur when resolving a channel name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Unknown channel: {0}")]
    Unknown(String),
}
