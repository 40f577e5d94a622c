mod channel;
mod command;
mod envelope;
mod error;
mod participant;
mod render;
mod synthetic;

pub use channel::Channel;
pub use command::{parse_command, Command, COMMAND_HELP};
pub use envelope::{current_timestamp, decode, encode, Envelope, TIMESTAMP_FORMAT};
pub use error::{ChannelError, DecodeError};
pub use participant::{joined_message, left_message, ParticipantId, SYNTHETIC_SENDER};
pub use render::{console_line, render, session_banner};
pub use synthetic::{sent_notice, sequence_of, synthetic_message, SyntheticTally};
