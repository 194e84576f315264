use uuid::Uuid;

/// Errors surfaced by the checkout, settlement and reclaim paths.
///
/// Everything except [`OrderError::Inconsistency`] is a business error: safe
/// to show to a caller, and its message never includes raw stock counters.
/// `Inconsistency` means a ledger invariant was violated mid-operation; it is
/// logged with full order and variant state and must reach manual
/// reconciliation, never be absorbed.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order or variant not found: {0}")]
    NotFound(Uuid),

    #[error("insufficient stock for variant {variant_id}: requested {requested}")]
    InsufficientStock { variant_id: Uuid, requested: u32 },

    #[error("price for variant {variant_id} no longer matches the catalog")]
    PriceMismatch {
        variant_id: Uuid,
        supplied: u32,
        current: u32,
    },

    #[error("order cannot be cancelled in state {state}")]
    CannotCancel { state: String },

    #[error("order does not belong to the requester")]
    AccessDenied,

    #[error("order already settled to terminal state {state}")]
    AlreadyTerminal { state: String },

    #[error("no fulfillment transition available from {from}")]
    InvalidTransition { from: String },

    #[error("invalid order request: {0}")]
    InvalidRequest(String),

    #[error("stock accounting inconsistency: {0}")]
    Inconsistency(String),
}
