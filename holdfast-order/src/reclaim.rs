use crate::error::OrderError;
use crate::models::{CancelReason, Order, OrderState};
use crate::repository::OrderStore;
use holdfast_catalog::StockLedger;
use holdfast_core::{Clock, Notifier, OrderEventKind};
use serde::Serialize;
use std::sync::{Arc, Mutex, TryLockError};
use uuid::Uuid;

/// What a single sweep did.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReclaimReport {
    pub processed: usize,
    pub failed: usize,
}

/// Periodic sweep that finds orders still awaiting payment beyond the grace
/// window, releases their reservations and cancels them.
///
/// Each order is handled independently: a failure is logged and counted but
/// never aborts the rest of the batch. The sweep never overlaps itself; an
/// invocation while another is in flight returns an empty report. It is also
/// naturally retry-safe, since the next run simply re-evaluates whatever is
/// still stale.
pub struct TimeoutReclaimer {
    ledger: Arc<StockLedger>,
    orders: Arc<OrderStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    grace: chrono::Duration,
    run_lock: Mutex<()>,
}

impl TimeoutReclaimer {
    pub fn new(
        ledger: Arc<StockLedger>,
        orders: Arc<OrderStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        grace: chrono::Duration,
    ) -> Self {
        Self {
            ledger,
            orders,
            clock,
            notifier,
            grace,
            run_lock: Mutex::new(()),
        }
    }

    pub fn reclaim_timeouts(&self) -> ReclaimReport {
        let _guard = match self.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                tracing::debug!("reclaim sweep already in flight, skipping");
                return ReclaimReport::default();
            }
            Err(TryLockError::Poisoned(err)) => err.into_inner(),
        };

        let cutoff = self.clock.now() - self.grace;
        let mut report = ReclaimReport::default();

        for row in self.orders.stale_pending(cutoff) {
            let mut order = row.lock().unwrap();
            // Re-check under the row lock: payment may have settled between
            // the scan and here, and then the order is no longer ours.
            if order.state != OrderState::PendingPayment || order.created_at > cutoff {
                continue;
            }
            match self.reclaim_one(&mut order) {
                Ok(()) => report.processed += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(order_id = %order.id, %err, "failed to reclaim stale order");
                }
            }
        }

        if report != ReclaimReport::default() {
            tracing::info!(
                processed = report.processed,
                failed = report.failed,
                "reclaim sweep finished"
            );
        }
        report
    }

    /// Background driver. `reclaim_timeouts` guards against overlap itself,
    /// so a manual sweep during a tick is harmless.
    pub async fn run(self: Arc<Self>, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.reclaim_timeouts();
        }
    }

    fn reclaim_one(&self, order: &mut Order) -> Result<(), OrderError> {
        // Release every line even if one fails; the order is cancelled either
        // way so a later sweep cannot double-release the lines that did go
        // back. Failures are reported for reconciliation.
        let mut failed_line: Option<(Uuid, String)> = None;
        for line in &order.lines {
            if let Err(err) = self.ledger.release(line.variant_id, line.quantity) {
                tracing::error!(
                    order_id = %order.id,
                    variant_id = %line.variant_id,
                    quantity = line.quantity,
                    %err,
                    "release failed while reclaiming"
                );
                failed_line.get_or_insert((line.variant_id, err.to_string()));
            }
        }

        order.cancel(CancelReason::TimedOut, self.clock.now())?;
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            "unpaid order timed out, reservation reclaimed"
        );
        self.notifier.notify(order.event(OrderEventKind::TimedOut));

        match failed_line {
            None => Ok(()),
            Some((variant_id, err)) => Err(OrderError::Inconsistency(format!(
                "release failed for variant {variant_id} while reclaiming order {}: {err}",
                order.id
            ))),
        }
    }
}
