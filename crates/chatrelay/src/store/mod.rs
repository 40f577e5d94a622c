//! Key-value store implementations.
//!
//! Concrete implementations of `chatrelay_core::store::KeyValueStore`:
//!
//! - `redis_impl`: Redis over the shared connection manager
//! - `memcached`: memcached text protocol over TCP
//! - `memory`: in-process map used by tests

pub mod memcached;
#[cfg(test)]
pub mod memory;
pub mod redis_impl;

pub use memcached::MemcachedStore;
#[cfg(test)]
pub use memory::MemoryStore;
pub use redis_impl::RedisStore;
