use std::fmt;

/// Default sender id used by the synthetic publisher.
pub const SYNTHETIC_SENDER: &str = "test_publisher";

/// Process-lifetime identity of a chat participant.
///
/// Created once at startup and shared read-only between the listener and the
/// publisher. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity derived from the current process id (`user_{pid}`).
    pub fn from_process() -> Self {
        Self::for_pid(std::process::id())
    }

    pub fn for_pid(pid: u32) -> Self {
        Self(format!("user_{}", pid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `sender` names this participant.
    pub fn is_author_of(&self, sender: &str) -> bool {
        self.0 == sender
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alert text published when a participant joins.
pub fn joined_message(participant: &ParticipantId) -> String {
    format!("{} joined the chat!", participant)
}

/// Alert text published when a participant leaves.
pub fn left_message(participant: &ParticipantId) -> String {
    format!("{} left the chat!", participant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_pid() {
        assert_eq!(ParticipantId::for_pid(4242).as_str(), "user_4242");
    }

    #[test]
    fn test_from_process_is_stable() {
        assert_eq!(ParticipantId::from_process(), ParticipantId::from_process());
    }

    #[test]
    fn test_is_author_of() {
        let me = ParticipantId::new("user_1");
        assert!(me.is_author_of("user_1"));
        assert!(!me.is_author_of("user_10"));
        assert!(!me.is_author_of(SYNTHETIC_SENDER));
    }

    #[test]
    fn test_presence_messages() {
        let me = ParticipantId::new("user_9");
        assert_eq!(joined_message(&me), "user_9 joined the chat!");
        assert_eq!(left_message(&me), "user_9 left the chat!");
    }
}
