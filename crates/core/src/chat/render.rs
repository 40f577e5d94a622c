//! Pure rendering of envelopes and session text.

use super::channel::Channel;
use super::command::COMMAND_HELP;
use super::envelope::Envelope;
use super::participant::ParticipantId;

/// Renders an envelope with the template of the channel it arrived on.
///
/// - chat: `[time] sender: message`
/// - notification: `[time] NOTIFICATION - sender: message`
/// - alert: `[time] SYSTEM ALERT - message` (sender omitted)
pub fn render(channel: Channel, envelope: &Envelope) -> String {
    match channel {
        Channel::ChatRoom => format!(
            "[{}] {}: {}",
            envelope.timestamp, envelope.sender, envelope.message
        ),
        Channel::Notifications => format!(
            "[{}] NOTIFICATION - {}: {}",
            envelope.timestamp, envelope.sender, envelope.message
        ),
        Channel::SystemAlerts => {
            format!("[{}] SYSTEM ALERT - {}", envelope.timestamp, envelope.message)
        }
    }
}

/// Renders an envelope for the console, prefixed with the channel icon.
pub fn console_line(channel: Channel, envelope: &Envelope) -> String {
    format!("{} {}", channel.icon(), render(channel, envelope))
}

/// Banner printed when an interactive session starts.
pub fn session_banner(participant: &ParticipantId) -> String {
    let mut output = String::from("\n💬 REAL-TIME CHAT DEMO\n");
    output.push_str(&"=".repeat(50));
    output.push_str(&format!("\n🎭 You are: {}\n📍 Commands:", participant));
    for help in COMMAND_HELP {
        output.push_str(&format!("\n   - {}", help));
    }
    output.push_str(
        "\n\n🚀 Start another terminal and run this program to see real-time messaging!\n",
    );
    output.push_str(&"-".repeat(50));
    output
}
