//! Subscription listener: receives, decodes, self-filters and renders.

use tokio::sync::{broadcast, mpsc};

use chatrelay_core::broker::{Broker, BrokerError, RawMessage, Subscription};
use chatrelay_core::chat::{console_line, decode, Channel, Envelope, ParticipantId};

use crate::output::Output;

/// Lifecycle of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Subscribed,
    Listening,
    Closed,
}

/// Why the receive loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// The stop signal fired.
    Stopped,
    /// The subscription ended without an error.
    StreamClosed,
    /// A fatal broker error, reported once.
    Failed(BrokerError),
}

/// Outcome of one listener run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerReport {
    pub exit: ListenerExit,
    pub rendered: usize,
    pub self_filtered: usize,
    pub malformed: usize,
    pub foreign: usize,
}

impl ListenerReport {
    fn new(exit: ListenerExit) -> Self {
        Self {
            exit,
            rendered: 0,
            self_filtered: 0,
            malformed: 0,
            foreign: 0,
        }
    }
}

/// A rendered envelope together with the channel it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: Channel,
    pub envelope: Envelope,
}

/// Listens on the fixed channel set for one participant.
pub struct Listener<O: Output> {
    participant: ParticipantId,
    namespace: String,
    output: O,
    deliveries: Option<mpsc::UnboundedSender<Delivery>>,
    subscription: Option<Subscription>,
    state: ListenerState,
}

impl<O: Output> Listener<O> {
    pub fn new(participant: ParticipantId, namespace: impl Into<String>, output: O) -> Self {
        Self {
            participant,
            namespace: namespace.into(),
            output,
            deliveries: None,
            subscription: None,
            state: ListenerState::Idle,
        }
    }

    /// Also forwards every rendered envelope to `tx`.
    pub fn with_deliveries(mut self, tx: mpsc::UnboundedSender<Delivery>) -> Self {
        self.deliveries = Some(tx);
        self
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Subscribes to every channel in one call.
    ///
    /// Must complete before the session publishes anything, otherwise the
    /// session's own early messages could race the subscription.
    pub async fn subscribe(&mut self, broker: &dyn Broker) -> Result<(), BrokerError> {
        let subscription = broker.subscribe(&Channel::ALL).await?;
        self.subscription = Some(subscription);
        self.state = ListenerState::Subscribed;
        tracing::debug!(participant = %self.participant, "Listener subscribed");
        Ok(())
    }

    /// Runs the receive loop until `stop` fires, the subscription closes, or
    /// a fatal error occurs.
    ///
    /// A dropped stop sender counts as a stop signal.
    pub async fn run(&mut self, mut stop: broadcast::Receiver<()>) -> ListenerReport {
        let Some(mut subscription) = self.subscription.take() else {
            self.state = ListenerState::Closed;
            return ListenerReport::new(ListenerExit::Failed(BrokerError::SubscribeFailed(
                "listener is not subscribed".to_string(),
            )));
        };

        self.state = ListenerState::Listening;
        let mut report = ListenerReport::new(ListenerExit::Stopped);

        let exit = loop {
            tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::debug!("Listener received stop signal");
                    break ListenerExit::Stopped;
                }
                next = subscription.next() => match next {
                    Some(Ok(message)) => self.handle(message, &mut report),
                    Some(Err(err)) if err.is_fatal() => {
                        tracing::error!(error = %err, "Listener subscription failed");
                        self.output.line(&format!("❌ Listener error: {}", err));
                        break ListenerExit::Failed(err);
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "Listener skipped broker error");
                    }
                    None => {
                        tracing::info!("Listener subscription closed");
                        break ListenerExit::StreamClosed;
                    }
                },
            }
        };
        report.exit = exit;

        drop(subscription);
        self.state = ListenerState::Closed;
        tracing::debug!(
            rendered = report.rendered,
            self_filtered = report.self_filtered,
            malformed = report.malformed,
            foreign = report.foreign,
            "Listener closed"
        );
        report
    }

    fn handle(&self, message: RawMessage, report: &mut ListenerReport) {
        let Some(channel) = Channel::from_wire_name(&message.channel, &self.namespace) else {
            tracing::warn!(channel = %message.channel, "Message on unknown channel skipped");
            report.foreign += 1;
            return;
        };

        let envelope = match decode(&message.payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%channel, error = %err, "Malformed envelope skipped");
                report.malformed += 1;
                return;
            }
        };

        if self.participant.is_author_of(&envelope.sender) {
            report.self_filtered += 1;
            return;
        }

        self.output.line(&console_line(channel, &envelope));
        report.rendered += 1;

        if let Some(tx) = &self.deliveries {
            let _ = tx.send(Delivery { channel, envelope });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chatrelay_core::broker::Result as BrokerResult;
    use chatrelay_core::chat::encode;

    use crate::broker::MemoryBroker;

    const TIMEOUT: Duration = Duration::from_secs(2);

    /// Broker whose single subscription is fed by the test.
    struct ScriptedBroker {
        rx: Mutex<Option<mpsc::Receiver<BrokerResult<RawMessage>>>>,
    }

    impl ScriptedBroker {
        fn new() -> (Self, mpsc::Sender<BrokerResult<RawMessage>>) {
            let (tx, rx) = mpsc::channel(16);
            (
                Self {
                    rx: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    #[async_trait]
    impl Broker for ScriptedBroker {
        async fn publish(&self, _channel: Channel, _payload: &str) -> BrokerResult<usize> {
            Ok(0)
        }

        async fn subscribe(&self, _channels: &[Channel]) -> BrokerResult<Subscription> {
            let rx = self
                .rx
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| BrokerError::SubscribeFailed("already subscribed".to_string()))?;
            Ok(Subscription::new(rx))
        }
    }

    fn raw(channel: Channel, sender: &str, message: &str) -> RawMessage {
        RawMessage::new(channel.as_str(), encode(sender, message, "10:00:00"))
    }

    fn listener(id: &str) -> (Listener<mpsc::UnboundedSender<String>>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Listener::new(ParticipantId::new(id), "", tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, _lines) = listener("user_1");
        assert_eq!(listener.state(), ListenerState::Idle);

        listener.subscribe(&broker).await.unwrap();
        assert_eq!(listener.state(), ListenerState::Subscribed);

        drop(tx);
        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let report = listener.run(stop_rx).await;

        assert_eq!(report.exit, ListenerExit::StreamClosed);
        assert_eq!(listener.state(), ListenerState::Closed);
    }

    #[tokio::test]
    async fn test_run_without_subscription_fails() {
        let (mut listener, _lines) = listener("user_1");
        let (_stop_tx, stop_rx) = broadcast::channel(1);

        let report = listener.run(stop_rx).await;
        assert!(matches!(
            report.exit,
            ListenerExit::Failed(BrokerError::SubscribeFailed(_))
        ));
        assert_eq!(listener.state(), ListenerState::Closed);
    }

    #[tokio::test]
    async fn test_self_filter() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, mut lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        tx.send(Ok(raw(Channel::ChatRoom, "A", "mine"))).await.unwrap();
        tx.send(Ok(raw(Channel::ChatRoom, "B", "theirs"))).await.unwrap();
        drop(tx);

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let report = listener.run(stop_rx).await;

        assert_eq!(drain(&mut lines), vec!["💬 [10:00:00] B: theirs"]);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.self_filtered, 1);
    }

    #[tokio::test]
    async fn test_dispatch_by_channel() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, mut lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        tx.send(Ok(raw(Channel::ChatRoom, "B", "hi"))).await.unwrap();
        tx.send(Ok(raw(Channel::Notifications, "B", "note"))).await.unwrap();
        tx.send(Ok(raw(Channel::SystemAlerts, "B", "down"))).await.unwrap();
        drop(tx);

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        listener.run(stop_rx).await;

        assert_eq!(
            drain(&mut lines),
            vec![
                "💬 [10:00:00] B: hi",
                "🔔 [10:00:00] NOTIFICATION - B: note",
                "🚨 [10:00:00] SYSTEM ALERT - down",
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, mut lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        tx.send(Ok(RawMessage::new("chat_room", "not json")))
            .await
            .unwrap();
        tx.send(Ok(RawMessage::new("chat_room", vec![0xff, 0xfe])))
            .await
            .unwrap();
        tx.send(Ok(raw(Channel::ChatRoom, "B", "after"))).await.unwrap();
        drop(tx);

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let report = listener.run(stop_rx).await;

        assert_eq!(report.malformed, 2);
        assert_eq!(drain(&mut lines), vec!["💬 [10:00:00] B: after"]);
    }

    #[tokio::test]
    async fn test_foreign_channel_is_skipped() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, mut lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        tx.send(Ok(RawMessage::new(
            "other_room",
            encode("B", "x", "10:00:00"),
        )))
        .await
        .unwrap();
        drop(tx);

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let report = listener.run(stop_rx).await;

        assert_eq!(report.foreign, 1);
        assert!(drain(&mut lines).is_empty());
    }

    #[tokio::test]
    async fn test_fatal_error_is_reported_once() {
        let (broker, tx) = ScriptedBroker::new();
        let (mut listener, mut lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        tx.send(Err(BrokerError::SubscriptionLost("gone".to_string())))
            .await
            .unwrap();
        tx.send(Ok(raw(Channel::ChatRoom, "B", "never rendered")))
            .await
            .unwrap();

        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let report = listener.run(stop_rx).await;

        assert_eq!(
            report.exit,
            ListenerExit::Failed(BrokerError::SubscriptionLost("gone".to_string()))
        );
        assert_eq!(
            drain(&mut lines),
            vec!["❌ Listener error: Subscription lost: gone"]
        );
    }

    #[tokio::test]
    async fn test_stop_signal_ends_idle_listener() {
        let broker = MemoryBroker::new();
        let (mut listener, _lines) = listener("A");
        listener.subscribe(&broker).await.unwrap();

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { listener.run(stop_rx).await });

        stop_tx.send(()).unwrap();

        let report = tokio::time::timeout(TIMEOUT, handle)
            .await
            .expect("listener did not stop in time")
            .unwrap();
        assert_eq!(report.exit, ListenerExit::Stopped);
    }

    #[tokio::test]
    async fn test_deliveries_are_forwarded() {
        let broker = MemoryBroker::new();
        let (tx, mut deliveries) = mpsc::unbounded_channel();
        let (lines_tx, _lines) = mpsc::unbounded_channel::<String>();
        let mut listener =
            Listener::new(ParticipantId::new("A"), "", lines_tx).with_deliveries(tx);
        listener.subscribe(&broker).await.unwrap();

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { listener.run(stop_rx).await });

        broker
            .publish(Channel::Notifications, &encode("B", "n", "10:00:00"))
            .await
            .unwrap();

        let delivery = tokio::time::timeout(TIMEOUT, deliveries.recv())
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(delivery.channel, Channel::Notifications);
        assert_eq!(delivery.envelope.sender, "B");

        stop_tx.send(()).unwrap();
        let report = tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap();
        assert_eq!(report.rendered, 1);
    }
}
