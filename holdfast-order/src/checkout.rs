use crate::error::OrderError;
use crate::models::{Order, OrderLine};
use crate::repository::OrderStore;
use holdfast_catalog::{CatalogReader, StockError, StockLedger};
use holdfast_core::{Clock, Notifier, OrderEventKind};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// A line as submitted by the client, carrying the unit price the client saw.
#[derive(Debug, Clone, Deserialize)]
pub struct LineRequest {
    pub variant_id: Uuid,
    pub quantity: u32,
    pub unit_price: u32,
}

/// Validates and reserves stock for a new order, all-or-nothing: if any line
/// fails, every reservation already made in the same call is rolled back
/// before the error is returned.
pub struct CheckoutService {
    catalog: Arc<dyn CatalogReader>,
    ledger: Arc<StockLedger>,
    orders: Arc<OrderStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        ledger: Arc<StockLedger>,
        orders: Arc<OrderStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            orders,
            clock,
            notifier,
        }
    }

    pub fn create_order(
        &self,
        buyer_id: &str,
        mut lines: Vec<LineRequest>,
    ) -> Result<Order, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::InvalidRequest("order has no lines".to_string()));
        }
        if lines.iter().any(|line| line.quantity == 0) {
            return Err(OrderError::InvalidRequest(
                "line quantity must be positive".to_string(),
            ));
        }

        // Deterministic per-variant lock order across all callers prevents
        // lock-ordering deadlocks between orders sharing variants.
        lines.sort_by_key(|line| line.variant_id);

        let mut reserved: Vec<(Uuid, u32)> = Vec::with_capacity(lines.len());
        let mut order_lines = Vec::with_capacity(lines.len());

        for line in &lines {
            match self.reserve_line(line) {
                Ok(order_line) => {
                    reserved.push((line.variant_id, line.quantity));
                    order_lines.push(order_line);
                }
                Err(err) => {
                    self.roll_back(&reserved);
                    return Err(err);
                }
            }
        }

        let order = Order::new(buyer_id.to_string(), order_lines, self.clock.now());
        self.orders.insert(order.clone());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            buyer_id,
            lines = order.lines.len(),
            "order placed, stock reserved"
        );
        self.notifier.notify(order.event(OrderEventKind::Placed));
        Ok(order)
    }

    fn reserve_line(&self, line: &LineRequest) -> Result<OrderLine, OrderError> {
        let variant = self
            .catalog
            .variant(line.variant_id)
            .filter(|v| v.active)
            .ok_or(OrderError::NotFound(line.variant_id))?;

        // Reject stale or tampered prices before touching the ledger.
        if variant.price != line.unit_price {
            return Err(OrderError::PriceMismatch {
                variant_id: line.variant_id,
                supplied: line.unit_price,
                current: variant.price,
            });
        }

        self.ledger
            .reserve(line.variant_id, line.quantity)
            .map_err(|err| match err {
                StockError::InsufficientStock { requested, .. } => OrderError::InsufficientStock {
                    variant_id: line.variant_id,
                    requested,
                },
                StockError::NotFound(id) => OrderError::NotFound(id),
                other => OrderError::Inconsistency(other.to_string()),
            })?;

        Ok(OrderLine {
            variant_id: line.variant_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
    }

    fn roll_back(&self, reserved: &[(Uuid, u32)]) {
        for (variant_id, qty) in reserved {
            if let Err(err) = self.ledger.release(*variant_id, *qty) {
                // A failed rollback leaves the counters wrong; this needs
                // manual reconciliation.
                tracing::error!(%variant_id, qty, %err, "failed to roll back checkout reservation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_catalog::{InMemoryCatalog, Variant};
    use holdfast_core::{NoopNotifier, SystemClock};
    use crate::models::{OrderStatus, PaymentStatus};

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        ledger: Arc<StockLedger>,
        orders: Arc<OrderStore>,
        checkout: CheckoutService,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Arc::new(InMemoryCatalog::new());
            let ledger = Arc::new(StockLedger::new());
            let orders = Arc::new(OrderStore::new());
            let checkout = CheckoutService::new(
                catalog.clone(),
                ledger.clone(),
                orders.clone(),
                Arc::new(SystemClock),
                Arc::new(NoopNotifier),
            );
            Self {
                catalog,
                ledger,
                orders,
                checkout,
            }
        }

        fn add_variant(&self, price: u32, stock: u32) -> Uuid {
            let id = Uuid::new_v4();
            self.catalog.upsert(Variant {
                id,
                sku: format!("SKU-{}", &id.simple().to_string()[..6]),
                name: "test variant".to_string(),
                price,
                active: true,
            });
            self.ledger.register(id, stock).unwrap();
            id
        }
    }

    fn line(variant_id: Uuid, quantity: u32, unit_price: u32) -> LineRequest {
        LineRequest {
            variant_id,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn successful_checkout_reserves_and_persists_pending_order() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 10);
        let b = fx.add_variant(2500, 4);

        let order = fx
            .checkout
            .create_order("buyer-1", vec![line(a, 2, 1000), line(b, 1, 2500)])
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.total(), 4500);
        assert_eq!(fx.ledger.levels(a).unwrap().reserved, 2);
        assert_eq!(fx.ledger.levels(b).unwrap().reserved, 1);
        assert!(fx.orders.snapshot(order.id).is_some());
    }

    #[test]
    fn failure_on_a_later_line_rolls_back_earlier_reservations() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 10);
        let b = fx.add_variant(2500, 1);

        let err = fx
            .checkout
            .create_order("buyer-1", vec![line(a, 2, 1000), line(b, 3, 2500)])
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        // nothing left dangling
        assert_eq!(fx.ledger.levels(a).unwrap().reserved, 0);
        assert_eq!(fx.ledger.levels(b).unwrap().reserved, 0);
        assert!(fx.orders.is_empty());
    }

    #[test]
    fn stale_price_is_rejected_before_reserving() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 10);

        let err = fx
            .checkout
            .create_order("buyer-1", vec![line(a, 1, 900)])
            .unwrap_err();

        assert!(matches!(err, OrderError::PriceMismatch { .. }));
        assert_eq!(fx.ledger.levels(a).unwrap().reserved, 0);
    }

    #[test]
    fn inactive_or_unknown_variant_is_not_found() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 10);
        fx.catalog.upsert(Variant {
            id: a,
            sku: "SKU".to_string(),
            name: "retired".to_string(),
            price: 1000,
            active: false,
        });

        assert!(matches!(
            fx.checkout.create_order("buyer-1", vec![line(a, 1, 1000)]),
            Err(OrderError::NotFound(_))
        ));
        assert!(matches!(
            fx.checkout
                .create_order("buyer-1", vec![line(Uuid::new_v4(), 1, 1000)]),
            Err(OrderError::NotFound(_))
        ));
    }

    #[test]
    fn empty_and_zero_quantity_requests_are_invalid() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 10);

        assert!(matches!(
            fx.checkout.create_order("buyer-1", vec![]),
            Err(OrderError::InvalidRequest(_))
        ));
        assert!(matches!(
            fx.checkout.create_order("buyer-1", vec![line(a, 0, 1000)]),
            Err(OrderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn duplicate_variant_lines_reserve_the_summed_quantity_or_nothing() {
        let fx = Fixture::new();
        let a = fx.add_variant(1000, 5);

        let order = fx
            .checkout
            .create_order("buyer-1", vec![line(a, 2, 1000), line(a, 3, 1000)])
            .unwrap();
        assert_eq!(fx.ledger.levels(a).unwrap().reserved, 5);
        assert_eq!(order.lines.len(), 2);

        // a second order over the same variant has nothing left to take
        let err = fx
            .checkout
            .create_order("buyer-2", vec![line(a, 1, 1000), line(a, 1, 1000)])
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        assert_eq!(fx.ledger.levels(a).unwrap().reserved, 5);
    }
}
