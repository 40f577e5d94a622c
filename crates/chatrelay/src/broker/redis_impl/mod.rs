//! Redis broker implementation.
//!
//! Publishes through a `ConnectionManager` (reconnects on its own and is
//! safe to share between tasks) and subscribes on a dedicated pub/sub
//! connection per subscription.

mod broker;
mod error;

pub use broker::RedisBroker;
