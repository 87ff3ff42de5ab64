//! The `broker` module is the pub/sub engine: per-topic bounded message
//! history, participant bookkeeping, and the asynchronous per-subscriber
//! delivery pipeline that decouples publishers from slow subscribers while
//! keeping memory bounded.

pub mod message;
pub mod participant;
pub mod registry;
pub mod topic;
pub mod worker;

pub use registry::TopicRegistry;
pub use topic::Topic;

#[cfg(test)]
mod tests;
