use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Result;

/// A message as delivered by the broker, before envelope decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Wire name of the channel the message arrived on (namespace included).
    pub channel: String,
    pub payload: Vec<u8>,
}

impl RawMessage {
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// A live subscription: a lazy, non-restartable sequence of raw messages.
///
/// Backends feed it from a forwarding task. An `Err` item reports a fatal
/// transport problem; `None` means the subscription is closed for good.
/// Dropping the subscription stops the forwarding task.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Result<RawMessage>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Creates a subscription fed by a channel the caller controls.
    pub fn new(rx: mpsc::Receiver<Result<RawMessage>>) -> Self {
        Self { rx, task: None }
    }

    /// Creates a subscription whose forwarding task is aborted on drop.
    pub fn with_task(rx: mpsc::Receiver<Result<RawMessage>>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Waits for the next message.
    ///
    /// Cancel safe, so it can sit in a `tokio::select!` next to a stop signal.
    pub async fn next(&mut self) -> Option<Result<RawMessage>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
