use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

use parlor_types::events::GatewayEvent;

/// Manages all connected clients and fans events out to them.
///
/// Registry refreshes go through the broadcast channel so every window
/// stays in sync; game events and request replies go through the targeted
/// per-connection channels.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel — all connected clients receive these events.
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// Per-connection targeted send channels.
    connections: RwLock<HashMap<Uuid, mpsc::UnboundedSender<GatewayEvent>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                connections: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to broadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Send an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Register a connection. Returns its id and the targeted receiver.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.write().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    /// Drop a connection's targeted channel.
    pub async fn unregister(&self, conn_id: Uuid) {
        self.inner.connections.write().await.remove(&conn_id);
    }

    /// Send a targeted event to one connection. Silently dropped when the
    /// connection is already gone.
    pub async fn send_to(&self, conn_id: Uuid, event: GatewayEvent) {
        let connections = self.inner.connections.read().await;
        if let Some(tx) = connections.get(&conn_id) {
            let _ = tx.send(event);
        }
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> GatewayEvent {
        GatewayEvent::Error {
            message: "nope".into(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let dispatcher = Dispatcher::new();
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        dispatcher.broadcast(sample_event());

        assert!(matches!(first.recv().await, Ok(GatewayEvent::Error { .. })));
        assert!(matches!(second.recv().await, Ok(GatewayEvent::Error { .. })));
    }

    #[tokio::test]
    async fn targeted_send_only_hits_the_addressed_connection() {
        let dispatcher = Dispatcher::new();
        let (first_id, mut first_rx) = dispatcher.register().await;
        let (_second_id, mut second_rx) = dispatcher.register().await;

        dispatcher.send_to(first_id, sample_event()).await;

        assert!(matches!(
            first_rx.recv().await,
            Some(GatewayEvent::Error { .. })
        ));
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_drops_the_channel() {
        let dispatcher = Dispatcher::new();
        let (conn_id, mut rx) = dispatcher.register().await;
        assert_eq!(dispatcher.connection_count().await, 1);

        dispatcher.unregister(conn_id).await;
        assert_eq!(dispatcher.connection_count().await, 0);

        dispatcher.send_to(conn_id, sample_event()).await;
        assert!(rx.recv().await.is_none());
    }
}
