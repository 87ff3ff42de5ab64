use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::broker::message::Message;
use crate::broker::participant::{DeliveryAction, DeliverySink, Publisher, Subscriber};
use crate::broker::{Topic, TopicRegistry};
use crate::utils::error::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Process-scoped map of login identity to session.
///
/// Sessions are keyed by username and live for the process lifetime; a
/// reconnecting client gets its existing session back once the password
/// matches.
pub struct SessionRegistry {
    topics: Arc<TopicRegistry>,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(topics: Arc<TopicRegistry>) -> Self {
        Self {
            topics,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `username`, creating one on first login.
    ///
    /// The identity is bound to the password given at first login; any later
    /// login under the same username must present the same password or fail
    /// with [`Error::InvalidCredentials`].
    pub fn login(&self, username: &str, password: &str) -> Result<Arc<Session>> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .entry(username.to_string())
            .or_insert_with(|| {
                info!(user = username, "creating session");
                Arc::new(Session::new(self.topics.clone(), username, password))
            })
            .clone();
        if session.password != password {
            return Err(Error::InvalidCredentials);
        }
        Ok(session)
    }
}

/// One logged-in identity: at most one joined topic and an optional sink to
/// the transport connection currently attached to it.
///
/// The session is both the publisher and the subscriber capability handed to
/// a topic on join.
pub struct Session {
    topics: Arc<TopicRegistry>,
    username: String,
    password: String,
    current_topic: tokio::sync::Mutex<Option<Arc<Topic>>>,
    sink: Mutex<Option<Arc<dyn DeliverySink>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(topics: Arc<TopicRegistry>, username: &str, password: &str) -> Self {
        Self {
            topics,
            username: username.to_string(),
            password: password.to_string(),
            current_topic: tokio::sync::Mutex::new(None),
            sink: Mutex::new(None),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Attaches the transport sink deliveries for this session go to.
    pub fn set_sink(&self, sink: Arc<dyn DeliverySink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    /// Publishes `payload` to the joined topic under this session's
    /// identity.
    pub async fn send_message(&self, payload: &str) -> Result<()> {
        let current = self.current_topic.lock().await;
        let topic = current.as_ref().ok_or(Error::NotJoined)?;
        topic.publish(&self.username, payload).await;
        Ok(())
    }

    /// Joins the topic named `name`, leaving the previous topic first.
    ///
    /// A no-op when already joined to `name`, so a repeated join neither
    /// duplicates the registration nor replays history twice.
    pub async fn join_topic(self: &Arc<Self>, name: &str) -> Result<()> {
        let mut current = self.current_topic.lock().await;
        if let Some(topic) = current.as_ref() {
            if topic.name() == name {
                return Ok(());
            }
        }
        if let Some(previous) = current.take() {
            previous
                .unregister_client(self.as_ref(), self.as_ref())
                .await?;
        }
        let target = self.topics.get_topic(name);
        target
            .register_client(self.clone(), self.clone())
            .await?;
        *current = Some(target);
        Ok(())
    }

    /// Names of the publishers registered with the joined topic.
    pub async fn list_participants(&self) -> Result<Vec<String>> {
        let current = self.current_topic.lock().await;
        let topic = current.as_ref().ok_or(Error::NotJoined)?;
        Ok(topic.publisher_names().await)
    }

    /// Releases the transport sink, closing it.
    ///
    /// Topic membership is untouched: transport teardown and membership are
    /// independent concerns, and the session simply stops being deliverable
    /// until a new connection attaches a sink.
    pub fn leave(&self) {
        if let Some(sink) = self.sink.lock().unwrap().take() {
            sink.close();
        }
    }
}

impl Publisher for Session {
    fn name(&self) -> &str {
        &self.username
    }
}

impl Subscriber for Session {
    fn id(&self) -> &str {
        &self.username
    }

    fn handle_message(&self, _topic: &str, message: &Message) -> Option<DeliveryAction> {
        let Some(sink) = self.sink.lock().unwrap().clone() else {
            warn!(user = %self.username, "no sink attached, message dropped");
            return None;
        };
        if !sink.is_usable() {
            warn!(user = %self.username, "sink is closed, message dropped");
            return None;
        }
        let line = format!(
            "FROM {} at {}: {}",
            message.sender,
            message.timestamp.format(TIMESTAMP_FORMAT),
            message.payload
        );
        Some(DeliveryAction::new(sink, line))
    }
}
