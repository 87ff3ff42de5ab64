//! # linebus
//!
//! `linebus` is an in-memory, multi-topic publish/subscribe message bus
//! served over a line-oriented TCP protocol. Clients log in under a
//! username, join one topic at a time, publish text messages, and receive
//! everything published by other participants, including a replay of the
//! topic's recent history at join time.
//!
//! ## Core Modules
//!
//! - `broker`: the pub/sub engine — topics, bounded history, and the
//!   per-subscriber delivery workers that provide ordering and backpressure.
//! - `client`: login identities and the session bridging the bus to a
//!   transport connection.
//! - `config`: loading and merging server configuration.
//! - `transport`: the line-oriented TCP server and command protocol.
//! - `utils`: the bounded container, error taxonomy, and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
