//! Broker backend implementations.
//!
//! This module provides concrete implementations of the `Broker` trait
//! defined in `chatrelay_core::broker`:
//!
//! - `memory`: in-process bus on tokio broadcast channels
//! - `redis_impl`: Redis pub/sub using the redis crate

pub mod memory;
pub mod redis_impl;

pub use memory::MemoryBroker;
pub use redis_impl::RedisBroker;
