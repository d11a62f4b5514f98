//! Event broadcasting to connected WebSocket clients

use crate::models::WsEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub type EventSender = broadcast::Sender<WsEvent>;
pub type EventReceiver = broadcast::Receiver<WsEvent>;

#[derive(Clone)]
pub struct WsConnection {
    pub id: Uuid,
    /// Authenticated user behind this connection
    pub user_id: Uuid,
}

pub struct EventBroadcaster {
    sender: EventSender,
    connections: Arc<RwLock<HashMap<Uuid, WsConnection>>>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn broadcast(&self, event: WsEvent) {
        let _ = self.sender.send(event);
    }

    pub fn add_connection(&self, conn: WsConnection) {
        self.connections.write().insert(conn.id, conn);
    }

    pub fn remove_connection(&self, id: &Uuid) {
        self.connections.write().remove(id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = EventBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast(WsEvent::Ping);
        match rx.recv().await.unwrap() {
            WsEvent::Ping => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_connection_tracking() {
        let broadcaster = EventBroadcaster::new(16);
        let conn = WsConnection {
            id: Uuid::from_u128(1),
            user_id: Uuid::from_u128(2),
        };
        broadcaster.add_connection(conn);
        assert_eq!(broadcaster.connection_count(), 1);
        broadcaster.remove_connection(&Uuid::from_u128(1));
        assert_eq!(broadcaster.connection_count(), 0);
    }
}
