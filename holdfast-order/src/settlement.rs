use crate::error::OrderError;
use crate::models::{CancelReason, FulfillmentStage, Order, OrderState};
use crate::repository::OrderStore;
use holdfast_catalog::StockLedger;
use holdfast_core::{Clock, Notifier, OrderEventKind, PaymentOutcome};
use std::sync::Arc;
use uuid::Uuid;

/// Resolves reservations: converts them into permanent sales on payment
/// success, or gives the stock back on failure or cancellation.
///
/// Settlement races the timeout reclaimer on the same orders, so every path
/// re-checks the order's state under its row lock before touching the
/// ledger; only the first to observe a pending order proceeds.
pub struct PaymentSettlement {
    ledger: Arc<StockLedger>,
    orders: Arc<OrderStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl PaymentSettlement {
    pub fn new(
        ledger: Arc<StockLedger>,
        orders: Arc<OrderStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger,
            orders,
            clock,
            notifier,
        }
    }

    /// Apply a gateway outcome to an order. Idempotent: a repeat of an
    /// already-applied outcome returns the settled order unchanged.
    pub fn confirm_payment(
        &self,
        order_id: Uuid,
        outcome: &PaymentOutcome,
    ) -> Result<Order, OrderError> {
        let row = self
            .orders
            .row(order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        let mut order = row.lock().unwrap();

        match outcome {
            PaymentOutcome::Succeeded { transaction_id } => match order.state {
                OrderState::PendingPayment => {
                    // The order settles even when a line's counters are
                    // broken: left PENDING it would re-enter the reclaim
                    // pool, and the sweep would release holds that were
                    // already consumed by the lines that did confirm.
                    let ledger = self.confirm_lines(&order);
                    order.mark_paid(self.clock.now())?;
                    tracing::info!(
                        order_id = %order.id,
                        transaction_id,
                        total = order.total(),
                        "payment settled, reservation confirmed as sale"
                    );
                    self.notifier
                        .notify(order.event(OrderEventKind::PaymentCompleted));
                    ledger?;
                    Ok(order.clone())
                }
                // Duplicate webhook for a payment we already applied.
                OrderState::Paid { .. } => Ok(order.clone()),
                // Payment landed after the reclaimer or a cancel got here
                // first; the caller must refund out of band.
                OrderState::Cancelled { .. } => Err(OrderError::AlreadyTerminal {
                    state: order.status().as_str().to_string(),
                }),
            },
            PaymentOutcome::Failed { reason } => match order.state {
                OrderState::PendingPayment => {
                    let ledger = self.release_lines(&order);
                    order.cancel(CancelReason::PaymentFailed, self.clock.now())?;
                    tracing::info!(
                        order_id = %order.id,
                        reason = reason.as_deref().unwrap_or("unspecified"),
                        "payment failed, reservation released"
                    );
                    self.notifier
                        .notify(order.event(OrderEventKind::PaymentFailed));
                    ledger?;
                    Ok(order.clone())
                }
                // No live reservation to release; nothing to double-apply.
                _ => Ok(order.clone()),
            },
        }
    }

    /// Buyer-initiated cancellation. Before payment this releases the
    /// reservation; after payment it is a refund and the stock comes back
    /// through `restock`, since it already left the reserved pool at confirm
    /// time.
    pub fn cancel_order(
        &self,
        order_id: Uuid,
        requested_by: &str,
        reason: &str,
    ) -> Result<Order, OrderError> {
        let row = self
            .orders
            .row(order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        let mut order = row.lock().unwrap();

        if order.buyer_id != requested_by {
            return Err(OrderError::AccessDenied);
        }

        match order.state {
            OrderState::Paid {
                stage: FulfillmentStage::Delivered,
            }
            | OrderState::Cancelled { .. } => Err(OrderError::CannotCancel {
                state: order.status().as_str().to_string(),
            }),
            OrderState::PendingPayment => {
                let ledger = self.release_lines(&order);
                order.cancel(CancelReason::BuyerCancelled, self.clock.now())?;
                tracing::info!(order_id = %order.id, reason, "order cancelled before payment");
                self.notifier.notify(order.event(OrderEventKind::Cancelled));
                ledger?;
                Ok(order.clone())
            }
            OrderState::Paid { .. } => {
                self.restock_lines(&order);
                order.cancel(CancelReason::Refunded, self.clock.now())?;
                tracing::info!(order_id = %order.id, reason, "paid order refunded, stock returned");
                self.notifier.notify(order.event(OrderEventKind::Refunded));
                Ok(order.clone())
            }
        }
    }

    // A confirm failure on a held reservation is an accounting bug, not a
    // business error. The remaining lines are still processed so the healthy
    // ones settle correctly; the failure is logged with full counter state
    // and surfaced for manual reconciliation.
    fn confirm_lines(&self, order: &Order) -> Result<(), OrderError> {
        let mut failed_line: Option<(Uuid, u32, String)> = None;
        for line in &order.lines {
            if let Err(err) = self.ledger.confirm(line.variant_id, line.quantity) {
                let levels = self.ledger.levels(line.variant_id).ok();
                tracing::error!(
                    order_id = %order.id,
                    variant_id = %line.variant_id,
                    quantity = line.quantity,
                    ?levels,
                    %err,
                    "confirm failed for a held reservation"
                );
                failed_line.get_or_insert((line.variant_id, line.quantity, err.to_string()));
            }
        }
        match failed_line {
            None => Ok(()),
            Some((variant_id, quantity, err)) => Err(OrderError::Inconsistency(format!(
                "confirm of {quantity} units of variant {variant_id} failed for order {}: {err}",
                order.id
            ))),
        }
    }

    fn release_lines(&self, order: &Order) -> Result<(), OrderError> {
        let mut failed_line: Option<(Uuid, u32, String)> = None;
        for line in &order.lines {
            if let Err(err) = self.ledger.release(line.variant_id, line.quantity) {
                let levels = self.ledger.levels(line.variant_id).ok();
                tracing::error!(
                    order_id = %order.id,
                    variant_id = %line.variant_id,
                    quantity = line.quantity,
                    ?levels,
                    %err,
                    "release failed for a held reservation"
                );
                failed_line.get_or_insert((line.variant_id, line.quantity, err.to_string()));
            }
        }
        match failed_line {
            None => Ok(()),
            Some((variant_id, quantity, err)) => Err(OrderError::Inconsistency(format!(
                "release of {quantity} units of variant {variant_id} failed for order {}: {err}",
                order.id
            ))),
        }
    }

    fn restock_lines(&self, order: &Order) {
        for line in &order.lines {
            if let Err(err) = self.ledger.restock(line.variant_id, line.quantity) {
                // Refund proceeds regardless; the missing restock is logged
                // for reconciliation.
                tracing::error!(
                    order_id = %order.id,
                    variant_id = %line.variant_id,
                    quantity = line.quantity,
                    %err,
                    "restock failed during refund"
                );
            }
        }
    }
}
