use async_trait::async_trait;

use crate::chat::Channel;

use super::{Result, Subscription};

/// Trait for the publish/subscribe operations the relay needs from a broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes an encoded envelope to a channel.
    ///
    /// Returns the number of subscribers the broker delivered it to.
    async fn publish(&self, channel: Channel, payload: &str) -> Result<usize>;

    /// Subscribes to all `channels` in one call.
    ///
    /// The subscription is established when this returns, so anything
    /// published afterwards is delivered to it.
    async fn subscribe(&self, channels: &[Channel]) -> Result<Subscription>;
}
