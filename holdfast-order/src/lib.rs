pub mod checkout;
pub mod error;
pub mod fulfillment;
pub mod models;
pub mod reclaim;
pub mod repository;
pub mod settlement;

pub use checkout::{CheckoutService, LineRequest};
pub use error::OrderError;
pub use fulfillment::FulfillmentService;
pub use models::{
    CancelReason, FulfillmentStage, Order, OrderLine, OrderState, OrderStatus, PaymentStatus,
};
pub use reclaim::{ReclaimReport, TimeoutReclaimer};
pub use repository::OrderStore;
pub use settlement::PaymentSettlement;
