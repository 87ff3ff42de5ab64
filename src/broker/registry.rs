use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::broker::topic::Topic;

/// Concurrent namespace of topics, created lazily on first access.
///
/// Constructed once at startup with the configured limits and injected into
/// whatever needs topics; it owns the shutdown of every topic it created.
pub struct TopicRegistry {
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    message_limit: usize,
    publisher_limit: usize,
    subscriber_limit: usize,
}

impl TopicRegistry {
    pub fn new(message_limit: usize, publisher_limit: usize, subscriber_limit: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            message_limit,
            publisher_limit,
            subscriber_limit,
        }
    }

    /// Returns the topic for `name`, creating it with the registry's limits
    /// on first access. Concurrent first-time lookups for the same name
    /// yield the same instance.
    pub fn get_topic(&self, name: &str) -> Arc<Topic> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(topic = name, "creating topic");
                Arc::new(Topic::new(
                    name,
                    self.message_limit,
                    self.publisher_limit,
                    self.subscriber_limit,
                ))
            })
            .clone()
    }

    /// Closes every topic. Used at process shutdown only.
    pub async fn close(&self) {
        let topics: Vec<Arc<Topic>> = self.topics.lock().unwrap().values().cloned().collect();
        for topic in topics {
            topic.close().await;
        }
    }
}
