//! Synthetic publisher: periodic test traffic rotating through the channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use chatrelay_core::broker::Broker;
use chatrelay_core::chat::{sent_notice, synthetic_message, Envelope};

use crate::output::Output;

/// Shortest delay between publishes; the ticker needs a non-zero period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Banner printed when the standalone publisher starts.
pub fn publisher_banner(interval: Duration) -> String {
    format!(
        "\n🚀 REDIS PUBLISHER TEST\n{}\nThis will send test messages every {} seconds.\n\
         Run `chatrelay chat` in another terminal to see real-time messages!\n\n\
         Press Ctrl+C to stop.\n",
        "=".repeat(22),
        interval.as_secs_f64()
    )
}

/// Publishes one envelope per interval until stopped.
pub struct SyntheticPublisher<O: Output> {
    broker: Arc<dyn Broker>,
    sender: String,
    interval: Duration,
    limit: Option<u64>,
    output: O,
}

impl<O: Output> SyntheticPublisher<O> {
    /// `interval` is clamped to at least [`MIN_INTERVAL`].
    pub fn new(broker: Arc<dyn Broker>, sender: impl Into<String>, interval: Duration, output: O) -> Self {
        Self {
            broker,
            sender: sender.into(),
            interval: interval.max(MIN_INTERVAL),
            limit: None,
            output,
        }
    }

    /// Stops after `cycles` publishes.
    pub fn with_limit(mut self, cycles: u64) -> Self {
        self.limit = Some(cycles);
        self
    }

    /// Runs the publish loop and returns how many publishes were attempted.
    ///
    /// The first publish happens immediately. Failed publishes are reported
    /// and still consume their sequence number.
    pub async fn run(&self, mut stop: broadcast::Receiver<()>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut seq = 0;
        loop {
            if self.limit.is_some_and(|limit| seq >= limit) {
                break;
            }

            tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::debug!(published = seq, "Synthetic publisher stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            seq += 1;
            let (channel, text) = synthetic_message(seq);
            let payload = Envelope::now(self.sender.as_str(), text).encode();

            match self.broker.publish(channel, &payload).await {
                Ok(receivers) => {
                    tracing::debug!(seq, %channel, receivers, "Synthetic message published");
                    self.output.line(&sent_notice(channel, seq));
                }
                Err(err) => {
                    tracing::warn!(seq, %channel, error = %err, "Synthetic publish failed");
                    self.output.line(&format!("❌ Failed to send message: {}", err));
                }
            }
        }

        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatrelay_core::broker::{BrokerError, Result as BrokerResult, Subscription};
    use chatrelay_core::chat::{decode, Channel};
    use tokio::sync::mpsc;

    use crate::broker::MemoryBroker;

    const INTERVAL: Duration = Duration::from_millis(5);

    struct FailingBroker;

    #[async_trait]
    impl Broker for FailingBroker {
        async fn publish(&self, _channel: Channel, _payload: &str) -> BrokerResult<usize> {
            Err(BrokerError::PublishFailed("broker unavailable".to_string()))
        }

        async fn subscribe(&self, _channels: &[Channel]) -> BrokerResult<Subscription> {
            Err(BrokerError::SubscribeFailed("broker unavailable".to_string()))
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_rotation_and_notices() {
        let broker = Arc::new(MemoryBroker::new());
        let mut subscription = broker.subscribe(&Channel::ALL).await.unwrap();
        let (tx, mut lines) = mpsc::unbounded_channel();

        let publisher = SyntheticPublisher::new(broker.clone(), "test_publisher", INTERVAL, tx)
            .with_limit(4);
        let (_stop_tx, stop_rx) = broadcast::channel(1);
        assert_eq!(publisher.run(stop_rx).await, 4);

        assert_eq!(
            drain(&mut lines),
            vec![
                "📤 Sent chat message #1",
                "🔔 Sent notification #2",
                "🚨 Sent alert #3",
                "📤 Sent chat message #4",
            ]
        );

        let expected = [
            ("chat_room", "Automated test message #1"),
            ("notifications", "System notification #2"),
            ("system_alerts", "System status update #3"),
            ("chat_room", "Automated test message #4"),
        ];
        for (channel, message) in expected {
            let raw = subscription.next().await.unwrap().unwrap();
            let envelope = decode(&raw.payload).unwrap();
            assert_eq!(raw.channel, channel);
            assert_eq!(envelope.message, message);
            assert_eq!(envelope.sender, "test_publisher");
        }
    }

    #[tokio::test]
    async fn test_publish_failure_continues() {
        let (tx, mut lines) = mpsc::unbounded_channel();
        let publisher =
            SyntheticPublisher::new(Arc::new(FailingBroker), "p", INTERVAL, tx).with_limit(2);
        let (_stop_tx, stop_rx) = broadcast::channel(1);

        assert_eq!(publisher.run(stop_rx).await, 2);
        let lines = drain(&mut lines);
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .all(|l| l.starts_with("❌ Failed to send message: Publish failed")));
    }

    #[tokio::test]
    async fn test_stop_signal_ends_unbounded_run() {
        let (tx, _lines) = mpsc::unbounded_channel();
        let publisher = SyntheticPublisher::new(
            Arc::new(MemoryBroker::new()),
            "p",
            Duration::from_secs(60),
            tx,
        );
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move { publisher.run(stop_rx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop_tx.send(()).unwrap();

        let published = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("publisher did not stop")
            .unwrap();
        assert_eq!(published, 1);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let (tx, mut lines) = mpsc::unbounded_channel();
        let publisher =
            SyntheticPublisher::new(Arc::new(MemoryBroker::new()), "p", Duration::ZERO, tx)
                .with_limit(2);
        assert_eq!(publisher.interval, MIN_INTERVAL);

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let published = tokio::time::timeout(Duration::from_secs(2), publisher.run(stop_rx))
            .await
            .expect("publisher did not finish");
        assert_eq!(published, 2);
        assert_eq!(drain(&mut lines).len(), 2);
    }

    #[test]
    fn test_banner_mentions_interval() {
        assert!(publisher_banner(Duration::from_secs(3)).contains("every 3 seconds"));
    }
}
