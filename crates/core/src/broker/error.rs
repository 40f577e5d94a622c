use thiserror::Error;

/// Errors that can occur while talking to the message broker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Broker connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("Publish failed: {0}")]
    PublishFailed(String),
    #[error("Subscription lost: {0}")]
    SubscriptionLost(String),
}

impl BrokerError {
    /// Returns true for errors that end a subscription.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BrokerError::ConnectionFailed(_) | BrokerError::SubscriptionLost(_)
        )
    }
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
