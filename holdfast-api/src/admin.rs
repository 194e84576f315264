use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use holdfast_catalog::{StockLevels, Variant};
use holdfast_order::ReclaimReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, orders::OrderResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterVariantRequest {
    pub sku: String,
    pub name: String,
    pub price: u32,
    pub stock: u32,
}

#[derive(Debug, Serialize)]
pub struct VariantResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub price: u32,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub variant_id: Uuid,
    pub total: u32,
    pub reserved: u32,
    pub available: u32,
}

impl StockResponse {
    fn new(variant_id: Uuid, levels: StockLevels) -> Self {
        Self {
            variant_id,
            available: levels.available(),
            total: levels.total,
            reserved: levels.reserved,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/variants", post(register_variant))
        .route("/v1/admin/variants/{id}/stock", get(variant_stock))
        .route("/v1/admin/orders/{id}/advance", post(advance_fulfillment))
        .route("/v1/admin/reclaim", post(reclaim_now))
}

async fn register_variant(
    State(state): State<AppState>,
    Json(req): Json<RegisterVariantRequest>,
) -> Result<(StatusCode, Json<VariantResponse>), AppError> {
    let variant = Variant {
        id: Uuid::new_v4(),
        sku: req.sku,
        name: req.name,
        price: req.price,
        active: true,
    };
    state.ledger.register(variant.id, req.stock)?;
    state.catalog.upsert(variant.clone());
    tracing::info!(variant_id = %variant.id, sku = %variant.sku, stock = req.stock, "variant registered");

    Ok((
        StatusCode::CREATED,
        Json(VariantResponse {
            id: variant.id,
            sku: variant.sku,
            name: variant.name,
            price: variant.price,
            active: variant.active,
        }),
    ))
}

async fn variant_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StockResponse>, AppError> {
    let levels = state.ledger.levels(id)?;
    Ok(Json(StockResponse::new(id, levels)))
}

async fn advance_fulfillment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.fulfillment.advance(id)?;
    Ok(Json(order.into()))
}

async fn reclaim_now(State(state): State<AppState>) -> Json<ReclaimReport> {
    Json(state.reclaimer.reclaim_timeouts())
}
