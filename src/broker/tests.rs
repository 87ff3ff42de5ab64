use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

use super::message::Message;
use super::participant::{DeliveryAction, DeliverySink, Publisher, Subscriber};
use super::registry::TopicRegistry;
use crate::utils::error::Error;

/// In-memory sink recording delivered lines; can be flipped to broken so
/// every write fails, or closed so it stops being usable.
struct TestSink {
    tx: UnboundedSender<String>,
    usable: AtomicBool,
    broken: AtomicBool,
}

impl DeliverySink for TestSink {
    fn write_line(&self, line: &str) -> bool {
        if self.broken.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.send(line.to_string()).is_ok()
    }

    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.usable.store(false, Ordering::SeqCst);
    }
}

struct TestClient {
    name: String,
    sink: Arc<TestSink>,
}

impl TestClient {
    fn new(name: &str) -> (Arc<Self>, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            name: name.to_string(),
            sink: Arc::new(TestSink {
                tx,
                usable: AtomicBool::new(true),
                broken: AtomicBool::new(false),
            }),
        });
        (client, rx)
    }

    fn break_sink(&self) {
        self.sink.broken.store(true, Ordering::SeqCst);
    }
}

impl Publisher for TestClient {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Subscriber for TestClient {
    fn id(&self) -> &str {
        &self.name
    }

    fn handle_message(&self, _topic: &str, message: &Message) -> Option<DeliveryAction> {
        if !self.sink.is_usable() {
            return None;
        }
        Some(DeliveryAction::new(
            self.sink.clone(),
            format!("{}: {}", message.sender, message.payload),
        ))
    }
}

async fn recv_line(rx: &mut UnboundedReceiver<String>) -> String {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a delivery")
        .expect("delivery channel closed")
}

#[tokio::test]
async fn test_history_replay_keeps_most_recent_messages() {
    // History limit 2: a late joiner sees exactly "hello" then "world".
    let registry = TopicRegistry::new(2, 10, 10);
    let topic = registry.get_topic("general");

    topic.publish("a", "stale").await;
    topic.publish("a", "hello").await;
    topic.publish("a", "world").await;

    let (b, mut rx) = TestClient::new("b");
    topic.register_client(b.clone(), b.clone()).await.unwrap();
    topic.publish("a", "later").await;

    assert_eq!(recv_line(&mut rx).await, "a: hello");
    assert_eq!(recv_line(&mut rx).await, "a: world");
    assert_eq!(recv_line(&mut rx).await, "a: later");
}

#[tokio::test]
async fn test_replay_then_live_messages_arrive_in_publish_order() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    topic.publish("a", "m1").await;
    topic.publish("a", "m2").await;

    let (b, mut rx) = TestClient::new("b");
    topic.register_client(b.clone(), b.clone()).await.unwrap();
    topic.publish("a", "m3").await;

    assert_eq!(recv_line(&mut rx).await, "a: m1");
    assert_eq!(recv_line(&mut rx).await, "a: m2");
    assert_eq!(recv_line(&mut rx).await, "a: m3");
}

#[tokio::test]
async fn test_subscriber_limit_rejects_extra_registration() {
    let registry = TopicRegistry::new(10, 10, 1);
    let topic = registry.get_topic("general");

    let (b, mut rx_b) = TestClient::new("b");
    topic.register_client(b.clone(), b.clone()).await.unwrap();

    let (c, mut rx_c) = TestClient::new("c");
    let err = topic.register_client(c.clone(), c.clone()).await.unwrap_err();
    assert_eq!(err, Error::Oversize { limit: 1 });

    // The rejected client is registered in neither set and b is unaffected.
    assert_eq!(topic.publisher_names().await, vec!["b".to_string()]);
    topic.publish("a", "still here").await;
    assert_eq!(recv_line(&mut rx_b).await, "a: still here");
    assert!(rx_c.try_recv().is_err());
}

#[tokio::test]
async fn test_publisher_limit_rejects_extra_registration() {
    let registry = TopicRegistry::new(10, 1, 10);
    let topic = registry.get_topic("general");

    let (b, _rx_b) = TestClient::new("b");
    topic.register_publisher(b.clone()).await.unwrap();

    let (c, _rx_c) = TestClient::new("c");
    let err = topic.register_publisher(c.clone()).await.unwrap_err();

    assert_eq!(err, Error::Oversize { limit: 1 });
    assert_eq!(topic.publisher_names().await, vec!["b".to_string()]);
}

#[tokio::test]
async fn test_broken_subscriber_does_not_affect_others() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    let (a, mut rx_a) = TestClient::new("a");
    let (b, mut rx_b) = TestClient::new("b");
    topic.register_client(a.clone(), a.clone()).await.unwrap();
    topic.register_client(b.clone(), b.clone()).await.unwrap();

    a.break_sink();
    topic.publish("p", "m1").await;
    topic.publish("p", "m2").await;
    topic.publish("p", "m3").await;

    assert_eq!(recv_line(&mut rx_b).await, "p: m1");
    assert_eq!(recv_line(&mut rx_b).await, "p: m2");
    assert_eq!(recv_line(&mut rx_b).await, "p: m3");
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_unregistered_subscriber_receives_nothing_further() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    let (a, mut rx) = TestClient::new("a");
    topic.register_client(a.clone(), a.clone()).await.unwrap();
    topic.publish("p", "before").await;
    assert_eq!(recv_line(&mut rx).await, "p: before");

    topic.unregister_client(a.as_ref(), a.as_ref()).await.unwrap();
    assert!(topic.publisher_names().await.is_empty());

    // The worker is joined by unregistration, nothing can be in flight.
    topic.publish("p", "after").await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unregistering_unknown_subscriber_is_consistency_error() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    let (a, _rx) = TestClient::new("a");
    let err = topic.unregister_subscriber(a.as_ref()).await.unwrap_err();

    assert_eq!(err, Error::NotSingleWorker { found: 0 });
}

#[tokio::test]
async fn test_close_stops_all_workers() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    let (a, mut rx_a) = TestClient::new("a");
    let (b, mut rx_b) = TestClient::new("b");
    topic.register_client(a.clone(), a.clone()).await.unwrap();
    topic.register_client(b.clone(), b.clone()).await.unwrap();

    topic.publish("p", "before close").await;
    assert_eq!(recv_line(&mut rx_a).await, "p: before close");
    assert_eq!(recv_line(&mut rx_b).await, "p: before close");

    registry.close().await;

    topic.publish("p", "after close").await;
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn test_registry_returns_same_topic_for_same_name() {
    let registry = TopicRegistry::new(10, 10, 10);
    let first = registry.get_topic("general");
    let second = registry.get_topic("general");
    let other = registry.get_topic("random");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(first.name(), "general");
}

#[tokio::test]
async fn test_subscriber_without_sink_is_skipped() {
    let registry = TopicRegistry::new(10, 10, 10);
    let topic = registry.get_topic("general");

    let (a, mut rx_a) = TestClient::new("a");
    let (b, mut rx_b) = TestClient::new("b");
    topic.register_client(a.clone(), a.clone()).await.unwrap();
    topic.register_client(b.clone(), b.clone()).await.unwrap();

    a.sink.close();
    topic.publish("p", "m1").await;

    assert_eq!(recv_line(&mut rx_b).await, "p: m1");
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_concurrent_publishes_preserve_per_subscriber_order() {
    let registry = TopicRegistry::new(100, 10, 10);
    let topic = registry.get_topic("general");

    let (a, mut rx) = TestClient::new("a");
    topic.register_client(a.clone(), a.clone()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let topic = topic.clone();
        handles.push(tokio::spawn(async move {
            topic.publish("p", &format!("m{i}")).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // The interleaving of writers is arbitrary but every message arrives
    // exactly once, and history order matches delivery order.
    let mut delivered = Vec::new();
    for _ in 0..10 {
        delivered.push(recv_line(&mut rx).await);
    }

    let (late, mut rx_late) = TestClient::new("late");
    topic.register_client(late.clone(), late.clone()).await.unwrap();
    let mut replayed = Vec::new();
    for _ in 0..10 {
        replayed.push(recv_line(&mut rx_late).await);
    }
    assert_eq!(delivered, replayed);
}
