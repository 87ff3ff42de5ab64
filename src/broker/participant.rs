//! Capability traits at the seam between the bus and its participants.
//!
//! A topic depends only on the capability it needs: `Publisher` to list who
//! can originate messages, `Subscriber` to turn messages into delivery
//! actions. One session type implements both.

use std::sync::Arc;

use crate::broker::message::Message;

/// Transport-side sink a subscriber's lines are written to.
///
/// The bus never assumes a concrete transport; anything that can report
/// liveness and accept a line of text qualifies.
pub trait DeliverySink: Send + Sync {
    /// Queue one line for the remote peer. Returns `false` when the
    /// transport is gone and the line was not accepted.
    fn write_line(&self, line: &str) -> bool;

    fn is_usable(&self) -> bool;

    fn close(&self);
}

/// The ability to originate messages on a topic under an identity.
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;
}

/// The ability to receive a topic's messages.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> &str;

    /// Turns a message into a deliverable action, or `None` when this
    /// subscriber currently has no usable sink. A `None` drops the message
    /// for this subscriber only.
    fn handle_message(&self, topic: &str, message: &Message) -> Option<DeliveryAction>;
}

/// A unit of deferred delivery work, produced by
/// [`Subscriber::handle_message`] and executed later by the subscriber's
/// delivery worker.
pub struct DeliveryAction {
    sink: Arc<dyn DeliverySink>,
    line: String,
}

impl DeliveryAction {
    pub fn new(sink: Arc<dyn DeliverySink>, line: String) -> Self {
        Self { sink, line }
    }

    /// Executes the delivery. Returns `false` when the sink rejected the
    /// line, which the worker treats as a disconnected subscriber.
    pub fn run(&self) -> bool {
        self.sink.write_line(&self.line)
    }
}
