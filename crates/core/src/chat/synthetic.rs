//! Synthetic traffic: the deterministic channel rotation and the tally used to
//! check what a listener rendered from it.

use std::collections::HashMap;

use super::channel::Channel;

/// Returns the target channel and message text for synthetic publish `seq`.
///
/// Sequence numbers start at 1: `1 -> chat_room`, `2 -> notifications`,
/// `3 -> system_alerts`, `4 -> chat_room`, ...
pub fn synthetic_message(seq: u64) -> (Channel, String) {
    match seq % 3 {
        1 => (Channel::ChatRoom, format!("Automated test message #{}", seq)),
        2 => (Channel::Notifications, format!("System notification #{}", seq)),
        _ => (Channel::SystemAlerts, format!("System status update #{}", seq)),
    }
}

/// Operator echo printed after a synthetic publish.
pub fn sent_notice(channel: Channel, seq: u64) -> String {
    match channel {
        Channel::ChatRoom => format!("📤 Sent chat message #{}", seq),
        Channel::Notifications => format!("🔔 Sent notification #{}", seq),
        Channel::SystemAlerts => format!("🚨 Sent alert #{}", seq),
    }
}

/// Extracts the trailing `#n` sequence number from a synthetic message.
pub fn sequence_of(message: &str) -> Option<u64> {
    message.rsplit_once('#')?.1.parse().ok()
}

/// Per-channel record of the synthetic messages a listener rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticTally {
    sequences: HashMap<Channel, Vec<u64>>,
    unrecognized: usize,
}

impl SyntheticTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one rendered message.
    pub fn record(&mut self, channel: Channel, message: &str) {
        match sequence_of(message) {
            Some(seq) => self.sequences.entry(channel).or_default().push(seq),
            None => self.unrecognized += 1,
        }
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.sequences.get(&channel).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.sequences.values().map(Vec::len).sum::<usize>() + self.unrecognized
    }

    pub fn unrecognized(&self) -> usize {
        self.unrecognized
    }

    /// Returns the sequence numbers seen on `channel`, in arrival order.
    pub fn sequences(&self, channel: Channel) -> &[u64] {
        self.sequences.get(&channel).map_or(&[], Vec::as_slice)
    }

    /// True when every channel saw strictly increasing sequence numbers.
    pub fn is_ordered(&self) -> bool {
        self.sequences
            .values()
            .all(|seqs| seqs.windows(2).all(|w| w[0] < w[1]))
    }

    /// Checks the tally against `cycles` synthetic publishes.
    ///
    /// Each channel must hold exactly the sequence numbers the rotation sends
    /// to it, in order, with nothing unrecognized.
    pub fn matches_cycles(&self, cycles: u64) -> bool {
        if self.unrecognized != 0 {
            return false;
        }
        Channel::ALL.iter().all(|channel| {
            let expected: Vec<u64> = (1..=cycles)
                .filter(|seq| synthetic_message(*seq).0 == *channel)
                .collect();
            self.sequences(*channel) == expected.as_slice()
        })
    }

    /// One-line summary of the tally.
    pub fn summary(&self) -> String {
        format!(
            "chat_room: {}, notifications: {}, system_alerts: {}, unrecognized: {}",
            self.count(Channel::ChatRoom),
            self.count(Channel::Notifications),
            self.count(Channel::SystemAlerts),
            self.unrecognized
        )
    }
}
