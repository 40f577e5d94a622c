use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ChannelError;

/// The fixed set of channels every participant subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    ChatRoom,
    Notifications,
    SystemAlerts,
}

impl Channel {
    /// All channels, in synthetic rotation order.
    pub const ALL: [Channel; 3] = [
        Channel::ChatRoom,
        Channel::Notifications,
        Channel::SystemAlerts,
    ];

    /// Returns the broker-side name of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::ChatRoom => "chat_room",
            Channel::Notifications => "notifications",
            Channel::SystemAlerts => "system_alerts",
        }
    }

    /// Console icon shown in front of rendered lines.
    pub fn icon(&self) -> &'static str {
        match self {
            Channel::ChatRoom => "💬",
            Channel::Notifications => "🔔",
            Channel::SystemAlerts => "🚨",
        }
    }

    /// Returns the wire name with the namespace prefix applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_core::chat::Channel;
    ///
    /// assert_eq!(Channel::ChatRoom.wire_name(""), "chat_room");
    /// assert_eq!(Channel::SystemAlerts.wire_name("test:"), "test:system_alerts");
    /// ```
    pub fn wire_name(&self, namespace: &str) -> String {
        format!("{}{}", namespace, self.as_str())
    }

    /// Resolves a wire name back to a channel, stripping the namespace.
    ///
    /// Returns `None` when the name lies outside the namespace or is not one
    /// of the fixed channels.
    pub fn from_wire_name(name: &str, namespace: &str) -> Option<Channel> {
        name.strip_prefix(namespace)?.parse().ok()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat_room" => Ok(Channel::ChatRoom),
            "notifications" => Ok(Channel::Notifications),
            "system_alerts" => Ok(Channel::SystemAlerts),
            other => Err(ChannelError::Unknown(other.to_string())),
        }
    }
}
