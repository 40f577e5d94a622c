//! Interactive chat session: the publisher half of the relay.
//!
//! The session owns the broker handle and the participant id. It subscribes
//! the listener before announcing itself, reads operator input line by line
//! and shuts the listener down on `/quit`, end of input, or interrupt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

use chatrelay_core::broker::{Broker, BrokerError};
use chatrelay_core::chat::{
    joined_message, left_message, parse_command, session_banner, Channel, Command, Envelope,
    ParticipantId,
};
use chatrelay_core::store::{format_stats, KeyValueStore};

use crate::listener::{Listener, ListenerReport};
use crate::output::Output;

/// Whether the input loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One participant's chat session.
pub struct Session<O: Output> {
    broker: Arc<dyn Broker>,
    participant: ParticipantId,
    stores: Vec<Arc<dyn KeyValueStore>>,
    output: O,
}

impl<O: Output> Session<O> {
    pub fn new(broker: Arc<dyn Broker>, participant: ParticipantId, output: O) -> Self {
        Self {
            broker,
            participant,
            stores: Vec::new(),
            output,
        }
    }

    /// Stores reported by `/stats`, in display order.
    pub fn with_stores(mut self, stores: Vec<Arc<dyn KeyValueStore>>) -> Self {
        self.stores = stores;
        self
    }

    /// Publishes `text` on `channel` in a fresh envelope.
    ///
    /// Failures are reported to the operator; returns whether the publish
    /// reached the broker.
    pub async fn send(&self, channel: Channel, text: &str) -> bool {
        let payload = Envelope::now(self.participant.as_str(), text).encode();

        match self.broker.publish(channel, &payload).await {
            Ok(receivers) => {
                tracing::debug!(%channel, receivers, "Message published");
                true
            }
            Err(err) => {
                tracing::warn!(%channel, error = %err, "Publish failed");
                self.output.line(&format!("❌ Failed to send message: {}", err));
                false
            }
        }
    }

    /// Handles one line of operator input.
    pub async fn handle_line(&self, line: &str) -> Flow {
        match parse_command(line) {
            Command::Empty => Flow::Continue,
            Command::Quit => Flow::Quit,
            Command::Stats => {
                self.show_stats().await;
                Flow::Continue
            }
            Command::Publish { channel, text } => {
                self.send(channel, &text).await;
                Flow::Continue
            }
        }
    }

    async fn show_stats(&self) {
        if self.stores.is_empty() {
            self.output
                .line("❌ Error getting stats: no cache stores connected");
            return;
        }

        let mut collected = Vec::with_capacity(self.stores.len());
        for store in &self.stores {
            match store.stats().await {
                Ok(stats) => collected.push(stats),
                Err(err) => {
                    tracing::warn!(backend = %store.backend(), error = %err, "Stats failed");
                    self.output
                        .line(&format!("❌ Error getting stats: {}", err));
                }
            }
        }

        if !collected.is_empty() {
            self.output.line(&format_stats(&collected));
        }
    }
}

/// Runs a full interactive session until `/quit`, end of input, or
/// `interrupt` completes.
///
/// Returns the listener's report, or `None` when the listener had to be
/// aborted after `grace`.
///
/// # Errors
///
/// Returns an error if the listener cannot subscribe; nothing has been
/// published at that point.
pub async fn run_chat<O, R, I>(
    session: Session<O>,
    namespace: &str,
    input: R,
    interrupt: I,
    grace: Duration,
) -> Result<Option<ListenerReport>, BrokerError>
where
    O: Output,
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    let participant = session.participant.clone();
    let output = session.output.clone();

    let mut listener = Listener::new(participant.clone(), namespace, output.clone());
    listener.subscribe(session.broker.as_ref()).await?;

    output.line(&session_banner(&participant));
    output.line(&format!("🎧 {} is listening for messages...", participant));

    let (stop_tx, stop_rx) = broadcast::channel(1);
    let mut handle = tokio::spawn(async move { listener.run(stop_rx).await });

    session
        .send(Channel::SystemAlerts, &joined_message(&participant))
        .await;

    let mut lines = input.lines();
    tokio::pin!(interrupt);

    loop {
        let next = tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("Interrupted, leaving the chat");
                output.line(&format!("\n👋 {} is leaving the chat...", participant));
                break;
            }
            next = lines.next_line() => next,
        };

        match next {
            Ok(Some(line)) => {
                if session.handle_line(&line).await == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("End of input");
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read input");
                break;
            }
        }
    }

    let _ = stop_tx.send(());
    session
        .send(Channel::SystemAlerts, &left_message(&participant))
        .await;

    let report = match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "Listener task failed");
            None
        }
        Err(_) => {
            tracing::warn!(?grace, "Listener did not stop in time, aborting");
            handle.abort();
            None
        }
    };

    output.line(&format!("\n👋 Thanks for testing the demo, {}!", participant));
    Ok(report)
}
