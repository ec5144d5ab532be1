//! WebSocket Connection Hub
//!
//! Manages all WebSocket connections, subscriptions, and message broadcasting.
//! Every connection belongs to one user and only receives that user's events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, TOPICS, WILDCARD_TOPIC};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

type Connections = Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>;
type Subscriptions = Arc<RwLock<HashMap<String, HashSet<ConnectionId>>>>;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Connections,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: Subscriptions,
    /// Broadcast channel for events (used internally)
    broadcast_tx: broadcast::Sender<WsEvent>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of the broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            broadcast_capacity: 1024,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Owner of the connection
    pub user_id: String,
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Topics this connection is subscribed to
    pub subscriptions: HashSet<String>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            broadcast_tx,
            config,
        }
    }

    /// Register a new WebSocket connection for a user
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        user_id: &str,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                user_id: user_id.to_string(),
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, user_id = %user_id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics, returning the accepted ones
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone())
                .or_insert_with(HashSet::new)
                .insert(id.to_string());

            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Deliver an event to the owning user's subscribers of its topic
    ///
    /// Returns the number of connections the message was handed to.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        self.clone_for_broadcast().broadcast(event).await
    }

    /// Publish an event without waiting for delivery
    pub fn publish(&self, event: WsEvent) {
        // Internal listeners may or may not exist
        let _ = self.broadcast_tx.send(event.clone());

        let hub = self.clone_for_broadcast();
        tokio::spawn(async move {
            hub.broadcast(&event).await;
        });
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get a receiver for the broadcast channel (internal use)
    pub fn subscribe_broadcast(&self) -> broadcast::Receiver<WsEvent> {
        self.broadcast_tx.subscribe()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of open connections owned by a user
    pub async fn user_connection_count(&self, user_id: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| h.user_id == user_id)
            .count()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    fn clone_for_broadcast(&self) -> ConnectionHubRef {
        ConnectionHubRef {
            connections: Arc::clone(&self.connections),
            subscriptions: Arc::clone(&self.subscriptions),
        }
    }
}

/// Known topic or the wildcard
fn is_valid_topic(topic: &str) -> bool {
    topic == WILDCARD_TOPIC || TOPICS.contains(&topic)
}

/// Reference to hub internals for async broadcast
struct ConnectionHubRef {
    connections: Connections,
    subscriptions: Subscriptions,
}

impl ConnectionHubRef {
    async fn broadcast(&self, event: &WsEvent) -> usize {
        let subs = self.subscriptions.read().await;
        let connections = self.connections.read().await;

        let direct = subs.get(&event.topic).cloned().unwrap_or_default();
        let wildcard = subs.get(WILDCARD_TOPIC).cloned().unwrap_or_default();

        let mut sent = 0;
        for id in direct.union(&wildcard) {
            if let Some(handle) = connections.get(id) {
                if handle.user_id == event.user_id
                    && handle.sender.send(event.message.clone()).is_ok()
                {
                    sent += 1;
                }
            }
        }

        if sent > 0 {
            tracing::trace!(topic = %event.topic, user_id = %event.user_id, subscribers = sent, "Broadcast event");
        }
        sent
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DailyGoal;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.broadcast_capacity, 1024);
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("logs"));
        assert!(is_valid_topic("alerts"));
        assert!(is_valid_topic("*"));

        assert!(!is_valid_topic("metrics.mood"));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("logs.*"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register("alice", tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);
        assert_eq!(hub.user_connection_count("alice").await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register("alice", tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["logs".to_string(), "bogus".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["logs"]);
        assert_eq!(hub.subscription_count("logs").await, 1);

        let unsubscribed = hub.unsubscribe(&id, vec!["logs".to_string()]).await.unwrap();
        assert_eq!(unsubscribed, vec!["logs"]);
        assert_eq!(hub.subscription_count("logs").await, 0);

        assert!(matches!(
            hub.subscribe("missing", vec!["logs".to_string()]).await,
            Err(HubError::ConnectionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig {
            max_connections: 2,
            broadcast_capacity: 16,
        });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        hub.register("a", tx1).await.unwrap();
        hub.register("b", tx2).await.unwrap();
        let result = hub.register("c", tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));
    }

    #[tokio::test]
    async fn test_events_reach_only_owning_user() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx_alice, mut rx_alice) = mpsc::unbounded_channel();
        let (tx_bob, mut rx_bob) = mpsc::unbounded_channel();
        let (tx_idle, mut rx_idle) = mpsc::unbounded_channel();

        let alice = hub.register("alice", tx_alice).await.unwrap();
        let bob = hub.register("bob", tx_bob).await.unwrap();
        let idle = hub.register("alice", tx_idle).await.unwrap();

        hub.subscribe(&alice, vec!["goal".to_string()]).await.unwrap();
        hub.subscribe(&bob, vec!["goal".to_string()]).await.unwrap();
        hub.subscribe(&idle, vec!["logs".to_string()]).await.unwrap();

        let event = WsEvent::goal_updated("alice", DailyGoal { amount: 3000 });
        assert_eq!(hub.broadcast(&event).await, 1);

        assert!(matches!(
            rx_alice.try_recv(),
            Ok(ServerMessage::GoalUpdated { .. })
        ));
        assert!(rx_bob.try_recv().is_err());
        assert!(rx_idle.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register("alice", tx).await.unwrap();
        hub.subscribe(&id, vec!["*".to_string()]).await.unwrap();

        hub.broadcast(&WsEvent::log_deleted("alice", "log-1")).await;
        hub.broadcast(&WsEvent::goal_updated("alice", DailyGoal::default()))
            .await;

        assert!(matches!(rx.try_recv(), Ok(ServerMessage::LogDeleted { .. })));
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::GoalUpdated { .. })));
    }

    #[tokio::test]
    async fn test_publish_delivers_in_background() {
        let hub = ConnectionHub::new(HubConfig::default());
        let mut internal = hub.subscribe_broadcast();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register("alice", tx).await.unwrap();
        hub.subscribe(&id, vec!["logs".to_string()]).await.unwrap();

        hub.publish(WsEvent::log_deleted("alice", "log-1"));

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert!(matches!(received, Some(ServerMessage::LogDeleted { .. })));
        assert_eq!(internal.recv().await.unwrap().topic, "logs");
    }
}
