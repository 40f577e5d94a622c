//! Redis pub/sub implementation.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc;

use chatrelay_core::broker::{Broker, BrokerError, RawMessage, Result, Subscription};
use chatrelay_core::chat::Channel;

use super::error::map_redis_error;

/// Buffer between the Redis pub/sub stream and a subscription.
const SUBSCRIPTION_BUFFER: usize = 64;

/// Redis pub/sub backend for relaying chat envelopes between processes.
pub struct RedisBroker {
    client: redis::Client,
    conn: ConnectionManager,
    namespace: String,
}

impl RedisBroker {
    /// Connects to Redis and verifies the server answers `PING`.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `namespace` - Prefix applied to every channel wire name
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::ConnectionFailed` if the connection cannot be established.
    pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| map_redis_error(e, BrokerError::ConnectionFailed))?;

        // A plain connection fails fast; the manager would retry with backoff.
        let mut probe = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error(e, BrokerError::ConnectionFailed))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut probe)
            .await
            .map_err(|e| map_redis_error(e, BrokerError::ConnectionFailed))?;

        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| map_redis_error(e, BrokerError::ConnectionFailed))?;

        Ok(Self {
            client,
            conn,
            namespace: namespace.into(),
        })
    }

    /// Returns a handle to the shared command connection.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, channel: Channel, payload: &str) -> Result<usize> {
        let mut conn = self.conn.clone();

        let receivers: usize = conn
            .publish(channel.wire_name(&self.namespace), payload)
            .await
            .map_err(|e| map_redis_error(e, BrokerError::PublishFailed))?;

        Ok(receivers)
    }

    async fn subscribe(&self, channels: &[Channel]) -> Result<Subscription> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| map_redis_error(e, BrokerError::SubscribeFailed))?;

        // One SUBSCRIBE for the whole set
        if !channels.is_empty() {
            pubsub
                .subscribe(wire_names(channels, &self.namespace))
                .await
                .map_err(|e| map_redis_error(e, BrokerError::SubscribeFailed))?;
        }

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            let mut stream = pubsub.on_message();

            while let Some(msg) = stream.next().await {
                let message = RawMessage::new(msg.get_channel_name(), msg.get_payload_bytes());
                if tx.send(Ok(message)).await.is_err() {
                    // Subscription dropped
                    return;
                }
            }

            tracing::info!("Redis subscription stream ended");
            let _ = tx
                .send(Err(BrokerError::SubscriptionLost(
                    "Redis pub/sub stream ended".to_string(),
                )))
                .await;
        });

        Ok(Subscription::with_task(rx, task))
    }
}

fn wire_names(channels: &[Channel], namespace: &str) -> Vec<String> {
    channels
        .iter()
        .map(|channel| channel.wire_name(namespace))
        .collect()
}
