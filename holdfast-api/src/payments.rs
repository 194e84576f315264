use axum::{extract::State, routing::post, Json, Router};
use holdfast_core::PaymentOutcome;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, orders::OrderResponse, state::AppState};

/// Callback payload from the payment provider. The outcome flattens into
/// `{"order_id": ..., "status": "SUCCEEDED", "transaction_id": ...}`.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub outcome: PaymentOutcome,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/payments/webhook", post(payment_webhook))
}

async fn payment_webhook(
    State(state): State<AppState>,
    Json(hook): Json<PaymentWebhook>,
) -> Result<Json<OrderResponse>, AppError> {
    tracing::info!(order_id = %hook.order_id, outcome = ?hook.outcome, "payment webhook received");
    let order = state.settlement.confirm_payment(hook.order_id, &hook.outcome)?;
    Ok(Json(order.into()))
}
