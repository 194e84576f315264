use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use holdfast_order::{LineRequest, Order, OrderError, OrderLine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub buyer_id: String,
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub lines: Vec<OrderLine>,
    pub total: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            status: order.status().as_str(),
            payment_status: order.payment_status().as_str(),
            total: order.total(),
            id: order.id,
            order_number: order.order_number,
            buyer_id: order.buyer_id,
            lines: order.lines,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/cancel", post(cancel_order))
}

async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state.checkout.create_order(&req.buyer_id, req.lines)?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.orders.snapshot(id).ok_or(OrderError::NotFound(id))?;
    Ok(Json(order.into()))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<CancelOrderRequest>>,
) -> Result<Json<OrderResponse>, AppError> {
    let buyer = headers
        .get("x-buyer-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(OrderError::AccessDenied)?;
    let reason = body
        .and_then(|Json(req)| req.reason)
        .unwrap_or_else(|| "buyer request".to_string());
    let order = state.settlement.cancel_order(id, buyer, &reason)?;
    Ok(Json(order.into()))
}
