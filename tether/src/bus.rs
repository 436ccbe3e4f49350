//! Worker side of the page message bus.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tether_core::{ClientId, ClientMessage, DeliveryError};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[cfg(feature = "metrics")]
use crate::metrics::{MESSAGES_DELIVERED, MESSAGES_DROPPED};

/// Pages currently connected to a worker, addressable by [`ClientId`].
///
/// Delivery is fire-and-forget: a page that has gone away yields
/// [`DeliveryError::ClientGone`] and is forgotten.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, mpsc::UnboundedSender<ClientMessage>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an identifier for a page that does not exist yet.
    ///
    /// Navigations know the identifier of the page they will produce before
    /// that page connects; [`connect_as`](Self::connect_as) claims it later.
    pub fn reserve(&self) -> ClientId {
        ClientId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Connects a new page and returns its identifier and inbox.
    pub fn connect(&self) -> (ClientId, mpsc::UnboundedReceiver<ClientMessage>) {
        let id = self.reserve();
        (id, self.connect_as(id))
    }

    /// Connects a page under a previously reserved identifier.
    ///
    /// An existing connection with the same identifier is replaced. Later
    /// reservations never hand out `id` again.
    pub fn connect_as(&self, id: ClientId) -> mpsc::UnboundedReceiver<ClientMessage> {
        self.next_id
            .fetch_max(id.get().saturating_add(1), Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        if self.clients.insert(id, tx).is_some() {
            debug!(client = %id, "client reconnected");
        } else {
            debug!(client = %id, "client connected");
        }
        rx
    }

    /// Forgets a page. Returns `false` when it was not connected.
    pub fn disconnect(&self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            debug!(client = %id, "client disconnected");
        }
        removed
    }

    /// Posts `message` to one page.
    pub fn post(&self, to: ClientId, message: ClientMessage) -> Result<(), DeliveryError> {
        let sent = match self.clients.get(&to) {
            Some(sender) => sender.send(message).is_ok(),
            None => {
                trace!(client = %to, ?message, "message for unknown client dropped");
                #[cfg(feature = "metrics")]
                metrics::counter!(*MESSAGES_DROPPED).increment(1);
                return Err(DeliveryError::ClientGone(to));
            }
        };

        if sent {
            trace!(client = %to, ?message, "message delivered");
            #[cfg(feature = "metrics")]
            metrics::counter!(*MESSAGES_DELIVERED).increment(1);
            Ok(())
        } else {
            self.clients.remove(&to);
            debug!(client = %to, "client inbox closed, dropping registration");
            #[cfg(feature = "metrics")]
            metrics::counter!(*MESSAGES_DROPPED).increment(1);
            Err(DeliveryError::ClientGone(to))
        }
    }

    /// Whether `id` is connected.
    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Number of connected pages.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// `true` when no page is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn post_reaches_connected_client() {
        let registry = ClientRegistry::new();
        let (id, mut inbox) = registry.connect();

        registry.post(id, ClientMessage::offline_mode(true)).unwrap();

        assert_eq!(inbox.recv().await, Some(ClientMessage::offline_mode(true)));
    }

    #[test]
    fn post_to_unknown_client_fails() {
        let registry = ClientRegistry::new();
        let err = registry
            .post(ClientId::new(42), ClientMessage::offline_mode(false))
            .unwrap_err();
        assert_eq!(err, DeliveryError::ClientGone(ClientId::new(42)));
    }

    #[test]
    fn closed_inbox_is_forgotten() {
        let registry = ClientRegistry::new();
        let (id, inbox) = registry.connect();
        drop(inbox);

        assert!(registry.post(id, ClientMessage::offline_mode(true)).is_err());
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn reserved_id_can_connect_later() {
        let registry = ClientRegistry::new();
        let id = registry.reserve();
        assert!(registry.post(id, ClientMessage::offline_mode(true)).is_err());

        let mut inbox = registry.connect_as(id);
        registry.post(id, ClientMessage::offline_mode(true)).unwrap();
        assert_eq!(inbox.recv().await, Some(ClientMessage::offline_mode(true)));
    }

    #[test]
    fn claimed_id_is_not_reissued() {
        let registry = ClientRegistry::new();
        let _inbox = registry.connect_as(ClientId::new(7));

        let (fresh, _other) = registry.connect();
        assert_eq!(fresh, ClientId::new(8));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn disconnect_removes_client() {
        let registry = ClientRegistry::new();
        let (id, _inbox) = registry.connect();
        assert_eq!(registry.len(), 1);
        assert!(registry.disconnect(id));
        assert!(!registry.disconnect(id));
        assert!(registry.is_empty());
    }
}
