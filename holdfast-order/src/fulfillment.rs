use crate::error::OrderError;
use crate::models::Order;
use crate::repository::OrderStore;
use holdfast_core::{Clock, Notifier, OrderEventKind};
use std::sync::Arc;
use uuid::Uuid;

/// Drives administrative fulfillment progress on paid orders, one stage at a
/// time. Each step fires a notification toward the external notifier.
pub struct FulfillmentService {
    orders: Arc<OrderStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl FulfillmentService {
    pub fn new(orders: Arc<OrderStore>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            orders,
            clock,
            notifier,
        }
    }

    pub fn advance(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let row = self
            .orders
            .row(order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        let mut order = row.lock().unwrap();

        let stage = order.advance_fulfillment(self.clock.now())?;
        tracing::info!(order_id = %order.id, ?stage, "fulfillment advanced");
        self.notifier
            .notify(order.event(OrderEventKind::FulfillmentAdvanced));
        Ok(order.clone())
    }
}
