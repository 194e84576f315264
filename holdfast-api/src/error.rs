use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use holdfast_catalog::StockError;
use holdfast_order::OrderError;
use serde_json::json;

/// Maps engine errors onto the HTTP surface. Business errors carry their
/// message through as 4xx; inconsistencies are logged in full and surfaced
/// as an opaque 500.
#[derive(Debug)]
pub enum AppError {
    Order(OrderError),
    Stock(StockError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        Self::Order(err)
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        Self::Stock(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Order(err) => match &err {
                OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                OrderError::InsufficientStock { .. }
                | OrderError::PriceMismatch { .. }
                | OrderError::InvalidRequest(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                OrderError::AccessDenied => (StatusCode::FORBIDDEN, err.to_string()),
                OrderError::CannotCancel { .. }
                | OrderError::AlreadyTerminal { .. }
                | OrderError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
                OrderError::Inconsistency(detail) => {
                    tracing::error!(%detail, "internal inconsistency reached the API boundary");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
            AppError::Stock(err) => match &err {
                StockError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                StockError::AlreadyRegistered(_) => (StatusCode::CONFLICT, err.to_string()),
                StockError::InsufficientStock { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                StockError::InsufficientReserved { .. } | StockError::InsufficientTotal { .. } => {
                    tracing::error!(%err, "stock invariant violation reached the API boundary");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
