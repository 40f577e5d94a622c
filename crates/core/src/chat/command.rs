use super::channel::Channel;

const NOTIFY_PREFIX: &str = "/notify ";
const ALERT_PREFIX: &str = "/alert ";

/// A classified line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line, nothing to do.
    Empty,
    /// Leave the chat.
    Quit,
    /// Print cache statistics.
    Stats,
    /// Publish `text` to `channel`.
    Publish { channel: Channel, text: String },
}

/// Classifies one line of operator input.
///
/// The line is trimmed first. `/quit` and `/stats` match case-insensitively;
/// `/notify ` and `/alert ` are case-sensitive prefixes followed by a space.
/// Anything else (including unknown slash commands) goes to `chat_room`
/// verbatim.
///
/// # Examples
///
/// ```
/// use chatrelay_core::chat::{parse_command, Channel, Command};
///
/// assert_eq!(parse_command("  "), Command::Empty);
/// assert_eq!(parse_command("/QUIT"), Command::Quit);
/// assert_eq!(
///     parse_command("/alert disk full"),
///     Command::Publish { channel: Channel::SystemAlerts, text: "disk full".to_string() }
/// );
/// ```
pub fn parse_command(line: &str) -> Command {
    let input = line.trim();

    if input.is_empty() {
        return Command::Empty;
    }

    if input.eq_ignore_ascii_case("/quit") {
        return Command::Quit;
    }

    if input.eq_ignore_ascii_case("/stats") {
        return Command::Stats;
    }

    if let Some(text) = input.strip_prefix(NOTIFY_PREFIX) {
        return Command::Publish {
            channel: Channel::Notifications,
            text: text.to_string(),
        };
    }

    if let Some(text) = input.strip_prefix(ALERT_PREFIX) {
        return Command::Publish {
            channel: Channel::SystemAlerts,
            text: text.to_string(),
        };
    }

    Command::Publish {
        channel: Channel::ChatRoom,
        text: input.to_string(),
    }
}

/// Help lines printed in the session banner.
pub const COMMAND_HELP: [&str; 5] = [
    "Just type to send to chat_room",
    "'/notify <message>' to send notification",
    "'/alert <message>' to send system alert",
    "'/quit' to exit",
    "'/stats' to show cache statistics",
];
