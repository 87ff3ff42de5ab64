use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::broker::message::Message;
use crate::broker::participant::{DeliveryAction, Subscriber};

/// Per-subscriber delivery pump.
///
/// One worker exists for each (topic, subscriber) registration. It owns a
/// bounded action queue and a dedicated task that executes queued actions
/// strictly in publish order, so a slow or dead subscriber can never delay
/// another subscriber or reorder its own messages. When the queue is full the
/// producer side of [`DeliveryWorker::send`] awaits a free slot, which is the
/// backpressure felt by the publish path; both the full and the empty
/// condition are plain bounded-channel semantics and repeat for the lifetime
/// of the worker.
pub struct DeliveryWorker {
    subscriber: Arc<dyn Subscriber>,
    tx: mpsc::Sender<DeliveryAction>,
    stop: watch::Sender<bool>,
    state: Mutex<WorkerState>,
}

/// Receiver parked between construction and `start` so history replay can be
/// queued before the task runs; join handle kept for shutdown.
struct WorkerState {
    rx: Option<mpsc::Receiver<DeliveryAction>>,
    handle: Option<JoinHandle<()>>,
}

impl DeliveryWorker {
    pub fn new(queue_size: usize, subscriber: Arc<dyn Subscriber>) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let (stop, _) = watch::channel(false);
        Self {
            subscriber,
            tx,
            stop,
            state: Mutex::new(WorkerState {
                rx: Some(rx),
                handle: None,
            }),
        }
    }

    pub fn subscriber_id(&self) -> &str {
        self.subscriber.id()
    }

    /// Hands the worker one message.
    ///
    /// The subscriber decides whether the message is deliverable at all; if
    /// it produces no action the message is dropped for this subscriber.
    /// Otherwise the action is queued, awaiting a free slot when the queue is
    /// full.
    pub async fn send(&self, topic: &str, message: &Message) {
        let Some(action) = self.subscriber.handle_message(topic, message) else {
            warn!(
                subscriber = self.subscriber.id(),
                topic, "no usable sink, message dropped"
            );
            return;
        };
        // Err here means the worker has already stopped and there is nobody
        // left to deliver to.
        if self.tx.send(action).await.is_err() {
            debug!(
                subscriber = self.subscriber.id(),
                topic, "worker stopped, message dropped"
            );
        }
    }

    /// Starts the background task. Called once, after history replay has
    /// been queued.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        let Some(mut rx) = state.rx.take() else {
            return;
        };
        let mut stop = self.stop.subscribe();
        let subscriber = self.subscriber.id().to_string();
        state.handle = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    action = rx.recv() => match action {
                        Some(action) => {
                            if !action.run() {
                                // Subscriber looks disconnected; stop trying
                                // to catch it up.
                                warn!(subscriber = %subscriber, "delivery failed, discarding backlog");
                                while rx.try_recv().is_ok() {}
                            }
                        }
                        None => break,
                    },
                }
            }
        }));
    }

    /// Requests termination and joins the task. Idempotent; queued actions
    /// that have not run yet are abandoned.
    pub async fn shutdown(&self) {
        let _ = self.stop.send(true);
        let handle = self.state.lock().await.handle.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(subscriber = self.subscriber.id(), %err, "worker task failed");
            }
        }
    }
}
