use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::broker::message::Message;
use crate::broker::participant::{Publisher, Subscriber};
use crate::broker::worker::DeliveryWorker;
use crate::utils::bounded::{BoundedContainer, OverflowPolicy};
use crate::utils::error::{Error, Result};

/// Worker queue capacity as a multiple of the history limit.
const QUEUE_FACTOR: usize = 3;

/// A named pub/sub channel with bounded history and bounded participant
/// counts.
///
/// Created lazily by the [`TopicRegistry`](crate::broker::TopicRegistry) and
/// lives until process shutdown. Publishing appends to the history and fans
/// the message out to every subscriber's [`DeliveryWorker`]; joining replays
/// the current history before any later publish is seen.
///
/// Locking: `participants` is the structural lock serializing
/// register/unregister; `fanout` serializes the append-and-enqueue step of
/// publishes (and registration replay) so every subscriber observes one
/// per-topic message order with no duplicates. Neither lock is held while a
/// message is actually written to a transport.
pub struct Topic {
    name: String,
    message_limit: usize,
    history: BoundedContainer<Message>,
    participants: Mutex<Participants>,
    fanout: Mutex<()>,
}

struct Participants {
    publishers: BoundedContainer<Arc<dyn Publisher>>,
    subscribers: BoundedContainer<Arc<DeliveryWorker>>,
}

impl Topic {
    pub(crate) fn new(
        name: &str,
        message_limit: usize,
        publisher_limit: usize,
        subscriber_limit: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            message_limit,
            history: BoundedContainer::new(Some(message_limit), OverflowPolicy::EvictOldest),
            participants: Mutex::new(Participants {
                publishers: BoundedContainer::new(
                    Some(publisher_limit),
                    OverflowPolicy::Reject,
                ),
                subscribers: BoundedContainer::new(
                    Some(subscriber_limit),
                    OverflowPolicy::Reject,
                ),
            }),
            fanout: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes `payload` under `sender`'s identity.
    ///
    /// The message is stamped, appended to the history (evicting the oldest
    /// entry when over capacity) and enqueued to every registered
    /// subscriber's worker. Returns once everything is enqueued; never waits
    /// for a delivery to complete. A full worker queue slows this call down
    /// (backpressure), it does not drop the message.
    pub async fn publish(&self, sender: &str, payload: &str) {
        let message = Message::new(sender, payload);
        let _order = self.fanout.lock().await;
        // EvictOldest never rejects.
        let _ = self.history.append(message.clone());
        let workers = self.participants.lock().await.subscribers.snapshot();
        debug!(topic = %self.name, sender, subscribers = workers.len(), "publishing message");
        for worker in workers {
            worker.send(&self.name, &message).await;
        }
    }

    pub async fn register_publisher(&self, publisher: Arc<dyn Publisher>) -> Result<()> {
        let participants = self.participants.lock().await;
        participants.publishers.append(publisher)
    }

    pub async fn unregister_publisher(&self, publisher: &dyn Publisher) {
        let participants = self.participants.lock().await;
        participants
            .publishers
            .remove_where(|p| p.name() == publisher.name());
    }

    /// Registers a subscriber and starts its delivery worker.
    ///
    /// The current history is replayed to the worker's queue oldest-first
    /// before the worker starts and before any later publish can reach it,
    /// so replay and live messages never interleave out of order. Fails with
    /// [`Error::Oversize`] when the subscriber set is full; the worker is
    /// then discarded without ever starting.
    pub async fn register_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        let _order = self.fanout.lock().await;
        let participants = self.participants.lock().await;
        self.add_subscriber(&participants, subscriber).await
    }

    /// Unregisters a subscriber, stopping and joining its delivery worker.
    ///
    /// A lookup that does not find exactly one worker for the subscriber is
    /// corrupted bookkeeping and fails with [`Error::NotSingleWorker`].
    pub async fn unregister_subscriber(&self, subscriber: &dyn Subscriber) -> Result<()> {
        let _order = self.fanout.lock().await;
        let participants = self.participants.lock().await;
        self.remove_subscriber(&participants, subscriber.id()).await
    }

    /// Registers one client as both publisher and subscriber, atomically
    /// with respect to this topic's participant sets. If the subscriber half
    /// fails the publisher half is rolled back.
    pub async fn register_client(
        &self,
        publisher: Arc<dyn Publisher>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<()> {
        let _order = self.fanout.lock().await;
        let participants = self.participants.lock().await;
        let publisher_name = publisher.name().to_string();
        participants.publishers.append(publisher)?;
        if let Err(err) = self.add_subscriber(&participants, subscriber).await {
            participants
                .publishers
                .remove_where(|p| p.name() == publisher_name);
            return Err(err);
        }
        info!(topic = %self.name, client = %publisher_name, "client registered");
        Ok(())
    }

    /// Unregisters one client from both participant sets.
    pub async fn unregister_client(
        &self,
        publisher: &dyn Publisher,
        subscriber: &dyn Subscriber,
    ) -> Result<()> {
        let _order = self.fanout.lock().await;
        let participants = self.participants.lock().await;
        participants
            .publishers
            .remove_where(|p| p.name() == publisher.name());
        self.remove_subscriber(&participants, subscriber.id()).await?;
        info!(topic = %self.name, client = publisher.name(), "client unregistered");
        Ok(())
    }

    /// Names of the currently registered publishers.
    pub async fn publisher_names(&self) -> Vec<String> {
        self.participants
            .lock()
            .await
            .publishers
            .snapshot()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Stops and joins every subscriber's delivery worker. Idempotent per
    /// worker; nothing published afterwards is delivered.
    pub async fn close(&self) {
        let _order = self.fanout.lock().await;
        let participants = self.participants.lock().await;
        for worker in participants.subscribers.snapshot() {
            worker.shutdown().await;
        }
        info!(topic = %self.name, "topic closed");
    }

    async fn add_subscriber(
        &self,
        participants: &Participants,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<()> {
        let worker = Arc::new(DeliveryWorker::new(
            QUEUE_FACTOR * self.message_limit,
            subscriber,
        ));
        participants.subscribers.append(worker.clone())?;
        // Replay fits: the queue holds QUEUE_FACTOR times the history limit.
        for message in self.history.snapshot() {
            worker.send(&self.name, &message).await;
        }
        worker.start().await;
        Ok(())
    }

    async fn remove_subscriber(
        &self,
        participants: &Participants,
        subscriber_id: &str,
    ) -> Result<()> {
        let matches: Vec<Arc<DeliveryWorker>> = participants
            .subscribers
            .snapshot()
            .into_iter()
            .filter(|w| w.subscriber_id() == subscriber_id)
            .collect();
        let [worker] = matches.as_slice() else {
            error!(
                topic = %self.name,
                subscriber = subscriber_id,
                found = matches.len(),
                "subscriber bookkeeping corrupted"
            );
            return Err(Error::NotSingleWorker {
                found: matches.len(),
            });
        };
        worker.shutdown().await;
        participants
            .subscribers
            .remove_where(|w| w.subscriber_id() == subscriber_id);
        Ok(())
    }
}
