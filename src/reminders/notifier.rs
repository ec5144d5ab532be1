//! Alert delivery

use crate::reminders::alert::Alert;
use crate::websocket::{ConnectionHub, WsEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Delivers alerts to a user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, alert: Alert);
}

/// Pushes alerts to the user's open WebSocket connections
pub struct HubNotifier {
    hub: Arc<ConnectionHub>,
}

impl HubNotifier {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Notifier for HubNotifier {
    async fn notify(&self, user_id: &str, alert: Alert) {
        tracing::debug!(user_id = %user_id, alert = ?alert, "Delivering alert");
        self.hub.publish(WsEvent::alert(user_id, alert));
    }
}

/// Keeps every alert in memory
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: tokio::sync::Mutex<Vec<(String, Alert)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub async fn take(&self) -> Vec<(String, Alert)> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: &str, alert: Alert) {
        self.sent.lock().await.push((user_id.to_string(), alert));
    }
}
