use serde::{Deserialize, Serialize};

/// Outcome reported by the external payment gateway for a single order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    /// Payment completed; the reservation becomes a permanent sale.
    Succeeded { transaction_id: String },
    /// Payment failed or was abandoned; the reservation goes back.
    Failed { reason: Option<String> },
}
