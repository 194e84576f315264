use chrono::{DateTime, Utc};
use holdfast_core::{OrderEvent, OrderEventKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

/// Forward-only fulfillment progress for a paid order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStage {
    Placed,
    Confirmed,
    Preparing,
    Shipped,
    Delivered,
}

impl FulfillmentStage {
    pub fn next(self) -> Option<FulfillmentStage> {
        match self {
            FulfillmentStage::Placed => Some(FulfillmentStage::Confirmed),
            FulfillmentStage::Confirmed => Some(FulfillmentStage::Preparing),
            FulfillmentStage::Preparing => Some(FulfillmentStage::Shipped),
            FulfillmentStage::Shipped => Some(FulfillmentStage::Delivered),
            FulfillmentStage::Delivered => None,
        }
    }
}

/// Why a cancelled order was cancelled. Doubles as its payment disposition:
/// the reason determines the derived [`PaymentStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    PaymentFailed,
    TimedOut,
    BuyerCancelled,
    Refunded,
}

/// Single tagged state machine for the order lifecycle.
///
/// Fulfillment progress only exists once payment has completed, so
/// combinations like "delivered but unpaid" cannot be constructed. The
/// legacy dual-axis view (fulfillment status x payment status) is derived by
/// [`Order::status`] and [`Order::payment_status`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    PendingPayment,
    Paid { stage: FulfillmentStage },
    Cancelled { reason: CancelReason },
}

/// Derived fulfillment-status axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Confirmed,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Derived payment-status axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

/// A line within an order. Holds a non-owning reference to its variant plus
/// an immutable unit-price snapshot captured at order creation, used to
/// detect price drift between cart and checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub variant_id: Uuid,
    pub quantity: u32,
    pub unit_price: u32,
}

impl OrderLine {
    pub fn subtotal(&self) -> u64 {
        u64::from(self.quantity) * u64::from(self.unit_price)
    }
}

/// An order and its lines. Owns the lines; never hard-deleted, only
/// transitioned to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: String,
    pub lines: Vec<OrderLine>,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(buyer_id: String, lines: Vec<OrderLine>, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            order_number: generate_order_number(id, now),
            buyer_id,
            lines,
            state: OrderState::PendingPayment,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    pub fn status(&self) -> OrderStatus {
        match self.state {
            OrderState::PendingPayment => OrderStatus::Pending,
            OrderState::Paid { stage } => match stage {
                FulfillmentStage::Placed => OrderStatus::Completed,
                FulfillmentStage::Confirmed => OrderStatus::Confirmed,
                FulfillmentStage::Preparing => OrderStatus::Preparing,
                FulfillmentStage::Shipped => OrderStatus::Shipped,
                FulfillmentStage::Delivered => OrderStatus::Delivered,
            },
            OrderState::Cancelled { .. } => OrderStatus::Cancelled,
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self.state {
            OrderState::PendingPayment => PaymentStatus::Pending,
            OrderState::Paid { .. } => PaymentStatus::Completed,
            OrderState::Cancelled { reason } => match reason {
                CancelReason::PaymentFailed | CancelReason::TimedOut => PaymentStatus::Failed,
                CancelReason::BuyerCancelled => PaymentStatus::Cancelled,
                CancelReason::Refunded => PaymentStatus::Refunded,
            },
        }
    }

    /// Delivered and cancelled orders accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            OrderState::Paid {
                stage: FulfillmentStage::Delivered
            } | OrderState::Cancelled { .. }
        )
    }

    /// PENDING -> COMPLETED on payment success.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        match self.state {
            OrderState::PendingPayment => {
                self.state = OrderState::Paid {
                    stage: FulfillmentStage::Placed,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(OrderError::AlreadyTerminal {
                state: self.status().as_str().to_string(),
            }),
        }
    }

    /// Any non-terminal state -> CANCELLED.
    pub fn cancel(&mut self, reason: CancelReason, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.is_terminal() {
            return Err(OrderError::CannotCancel {
                state: self.status().as_str().to_string(),
            });
        }
        self.state = OrderState::Cancelled { reason };
        self.updated_at = now;
        Ok(())
    }

    /// One forward fulfillment step on a paid order.
    pub fn advance_fulfillment(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<FulfillmentStage, OrderError> {
        let from = self.status().as_str().to_string();
        match self.state {
            OrderState::Paid { stage } => match stage.next() {
                Some(next) => {
                    self.state = OrderState::Paid { stage: next };
                    self.updated_at = now;
                    Ok(next)
                }
                None => Err(OrderError::InvalidTransition { from }),
            },
            _ => Err(OrderError::InvalidTransition { from }),
        }
    }

    pub fn event(&self, kind: OrderEventKind) -> OrderEvent {
        OrderEvent {
            order_id: self.id,
            order_number: self.order_number.clone(),
            kind,
            status: self.status().as_str().to_string(),
            payment_status: self.payment_status().as_str().to_string(),
            occurred_at: self.updated_at,
        }
    }
}

// Human-facing number: creation timestamp plus a short slice of the order id.
fn generate_order_number(id: Uuid, now: DateTime<Utc>) -> String {
    let short_id = &id.simple().to_string()[..8];
    format!("ORD-{}-{}", now.timestamp(), short_id.to_uppercase())
}
