use chrono::Duration;
use holdfast_catalog::{InMemoryCatalog, StockLedger};
use holdfast_core::{BroadcastNotifier, Clock};
use holdfast_order::{
    CheckoutService, FulfillmentService, OrderStore, PaymentSettlement, TimeoutReclaimer,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<InMemoryCatalog>,
    pub ledger: Arc<StockLedger>,
    pub orders: Arc<OrderStore>,
    pub checkout: Arc<CheckoutService>,
    pub settlement: Arc<PaymentSettlement>,
    pub fulfillment: Arc<FulfillmentService>,
    pub reclaimer: Arc<TimeoutReclaimer>,
    pub notifier: Arc<BroadcastNotifier>,
}

impl AppState {
    /// Wires the whole engine around one clock and one grace window.
    pub fn new(clock: Arc<dyn Clock>, payment_grace: Duration) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let ledger = Arc::new(StockLedger::new());
        let orders = Arc::new(OrderStore::new());
        let notifier = Arc::new(BroadcastNotifier::new(256));

        let checkout = Arc::new(CheckoutService::new(
            catalog.clone(),
            ledger.clone(),
            orders.clone(),
            clock.clone(),
            notifier.clone(),
        ));
        let settlement = Arc::new(PaymentSettlement::new(
            ledger.clone(),
            orders.clone(),
            clock.clone(),
            notifier.clone(),
        ));
        let fulfillment = Arc::new(FulfillmentService::new(
            orders.clone(),
            clock.clone(),
            notifier.clone(),
        ));
        let reclaimer = Arc::new(TimeoutReclaimer::new(
            ledger.clone(),
            orders.clone(),
            clock,
            notifier.clone(),
            payment_grace,
        ));

        Self {
            catalog,
            ledger,
            orders,
            checkout,
            settlement,
            fulfillment,
            reclaimer,
            notifier,
        }
    }
}
