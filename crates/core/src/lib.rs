//! chatrelay_core - pure types and traits for the chatrelay Pub/Sub demo.
//!
//! Everything in this crate is free of I/O. The async traits in [`broker`]
//! and [`store`] mark the seams where the `chatrelay` binary plugs in Redis,
//! Memcached and the in-memory test doubles.

pub mod broker;
pub mod chat;
pub mod store;
