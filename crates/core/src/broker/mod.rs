mod error;
mod subscription;
mod traits;

pub use error::{BrokerError, Result};
pub use subscription::{RawMessage, Subscription};
pub use traits::Broker;
