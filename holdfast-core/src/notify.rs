use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fired toward the external notifier on every order status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub kind: OrderEventKind,
    pub status: String,
    pub payment_status: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    Placed,
    PaymentCompleted,
    PaymentFailed,
    Cancelled,
    Refunded,
    TimedOut,
    FulfillmentAdvanced,
}

/// Fire-and-forget side-channel. Delivery failure must never roll back the
/// state change that produced the event, so the seam is infallible.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: OrderEvent);
}

/// Fans events out to in-process subscribers (SSE bridges, audit tails).
/// Events are dropped when nobody is listening.
pub struct BroadcastNotifier {
    tx: tokio::sync::broadcast::Sender<OrderEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: OrderEvent) {
        // send only errors when there are no receivers
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: OrderEvent) {}
}
