mod error;
mod persistence;
mod stats;
mod traits;

pub use error::{Result, StoreError};
pub use persistence::{demo_value, outcome_line, PersistenceOutcome, DEMO_KEY};
pub use stats::{format_stats, format_store_stats, Backend, StoreStats};
pub use traits::KeyValueStore;
