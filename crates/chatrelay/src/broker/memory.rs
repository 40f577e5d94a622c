//! In-memory broker implementation.
//!
//! Provides an in-process pub/sub bus using a tokio broadcast channel. All
//! channels share one bus so subscribers observe a single publish order, the
//! same guarantee a single Redis server gives one publisher.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use chatrelay_core::broker::{Broker, BrokerError, RawMessage, Result, Subscription};
use chatrelay_core::chat::Channel;

/// Bus capacity before slow subscribers start lagging.
const BUS_CAPACITY: usize = 256;

/// Buffer between the bus and a subscription.
const SUBSCRIPTION_BUFFER: usize = 64;

/// In-memory broker for single-process use (tests and `verify --broker memory`).
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    bus: broadcast::Sender<RawMessage>,
    namespace: String,
}

impl MemoryBroker {
    /// Creates a new broker with no subscribers.
    pub fn new() -> Self {
        Self::with_namespace("")
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            bus,
            namespace: namespace.into(),
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, channel: Channel, payload: &str) -> Result<usize> {
        let message = RawMessage::new(channel.wire_name(&self.namespace), payload);

        // No receivers just means nobody is subscribed yet.
        Ok(self.bus.send(message).unwrap_or(0))
    }

    async fn subscribe(&self, channels: &[Channel]) -> Result<Subscription> {
        let wanted: HashSet<String> = channels
            .iter()
            .map(|channel| channel.wire_name(&self.namespace))
            .collect();
        let mut bus_rx = self.bus.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            loop {
                match bus_rx.recv().await {
                    Ok(message) => {
                        if !wanted.contains(&message.channel) {
                            continue;
                        }
                        if tx.send(Ok(message)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "Memory subscription lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = tx
                            .send(Err(BrokerError::SubscriptionLost(
                                "memory broker dropped".to_string(),
                            )))
                            .await;
                        break;
                    }
                }
            }
        });

        Ok(Subscription::with_task(rx, task))
    }
}
