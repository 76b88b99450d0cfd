use tokio::sync::broadcast;
use uuid::Uuid;

/// A session lifecycle notification.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid },
    SignedOut { user_id: Uuid },
    TokenRefreshed { user_id: Uuid },
}

/// A broadcast stream of session lifecycle events. Publishers never block;
/// subscribers that fall behind observe a lag error and keep going.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    /// Creates a new event stream with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: AuthEvent) {
        tracing::debug!("🔔 Auth event: {:?}", event);
        if self.tx.send(event).is_err() {
            tracing::debug!("No auth event subscribers");
        }
    }

    /// Subscribes to the stream. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}
