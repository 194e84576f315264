use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use holdfast_api::{app, AppState};
use holdfast_core::SystemClock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

fn test_app() -> Router {
    app(AppState::new(Arc::new(SystemClock), Duration::minutes(15)))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_variant(router: &Router, price: u32, stock: u32) -> Uuid {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/admin/variants",
            json!({"sku": "SKU-TEST", "name": "test variant", "price": price, "stock": stock}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn place_order(router: &Router, buyer: &str, variant: Uuid, qty: u32, price: u32) -> Value {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/orders",
            json!({
                "buyer_id": buyer,
                "lines": [{"variant_id": variant, "quantity": qty, "unit_price": price}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn health_endpoint_responds() {
    let router = test_app();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn checkout_payment_and_stock_flow() {
    let router = test_app();
    let variant = register_variant(&router, 1500, 10).await;

    let order = place_order(&router, "alice", variant, 3, 1500).await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["payment_status"], "PENDING");
    assert_eq!(order["total"], 4500);
    let order_id = order["id"].as_str().unwrap().to_string();

    // reservation is visible in the stock view
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/v1/admin/variants/{variant}/stock"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stock = read_json(response).await;
    assert_eq!(stock["reserved"], 3);
    assert_eq!(stock["available"], 7);

    // provider reports success
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/payments/webhook",
            json!({"order_id": order_id, "status": "SUCCEEDED", "transaction_id": "tx_1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paid = read_json(response).await;
    assert_eq!(paid["status"], "COMPLETED");
    assert_eq!(paid["payment_status"], "COMPLETED");

    // confirmed units have left the pool for good
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/v1/admin/variants/{variant}/stock"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stock = read_json(response).await;
    assert_eq!(stock["total"], 7);
    assert_eq!(stock["reserved"], 0);
}

#[tokio::test]
async fn oversell_is_rejected_with_422() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 2).await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/orders",
            json!({
                "buyer_id": "bob",
                "lines": [{"variant_id": variant, "quantity": 5, "unit_price": 1000}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn stale_price_is_rejected_with_422() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/orders",
            json!({
                "buyer_id": "bob",
                "lines": [{"variant_id": variant, "quantity": 1, "unit_price": 900}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_order_returns_404() {
    let router = test_app();
    let response = router
        .oneshot(
            Request::get(format!("/v1/orders/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_requires_the_owning_buyer() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;
    let order = place_order(&router, "alice", variant, 1, 1000).await;
    let order_id = order["id"].as_str().unwrap();

    // no buyer header at all
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/v1/orders/{order_id}/cancel"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // somebody else's header
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/v1/orders/{order_id}/cancel"))
                .header("x-buyer-id", "mallory")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // the owner succeeds and the reservation is released
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/v1/orders/{order_id}/cancel"))
                .header("x-buyer-id", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled = read_json(response).await;
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["payment_status"], "CANCELLED");
}

#[tokio::test]
async fn duplicate_success_webhook_is_idempotent() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;
    let order = place_order(&router, "alice", variant, 2, 1000).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/v1/payments/webhook",
                json!({"order_id": order_id, "status": "SUCCEEDED", "transaction_id": "tx_1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/v1/admin/variants/{variant}/stock"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stock = read_json(response).await;
    // the second webhook must not confirm the units twice
    assert_eq!(stock["total"], 3);
    assert_eq!(stock["reserved"], 0);
}

#[tokio::test]
async fn failed_payment_releases_and_cancel_after_success_conflicts() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;

    let order = place_order(&router, "alice", variant, 2, 1000).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/payments/webhook",
            json!({"order_id": order_id, "status": "FAILED", "reason": "card declined"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let failed = read_json(response).await;
    assert_eq!(failed["status"], "CANCELLED");
    assert_eq!(failed["payment_status"], "FAILED");

    // a success webhook for the now-cancelled order is a conflict
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/payments/webhook",
            json!({"order_id": order_id, "status": "SUCCEEDED", "transaction_id": "tx_late"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn fulfillment_advances_through_admin_endpoint() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;
    let order = place_order(&router, "alice", variant, 1, 1000).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // advancing an unpaid order is a conflict
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/v1/admin/orders/{order_id}/advance"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/payments/webhook",
            json!({"order_id": order_id, "status": "SUCCEEDED", "transaction_id": "tx_1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // PLACED -> CONFIRMED -> PREPARING -> SHIPPED -> DELIVERED
    let mut last = Value::Null;
    for _ in 0..4 {
        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/v1/admin/orders/{order_id}/advance"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = read_json(response).await;
    }
    assert_eq!(last["status"], "DELIVERED");

    // delivered is the end of the line
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/v1/admin/orders/{order_id}/advance"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn manual_reclaim_reports_an_empty_sweep() {
    let router = test_app();
    let variant = register_variant(&router, 1000, 5).await;
    place_order(&router, "alice", variant, 1, 1000).await;

    // the order is fresh, so a sweep finds nothing
    let response = router
        .clone()
        .oneshot(
            Request::post("/v1/admin/reclaim")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = read_json(response).await;
    assert_eq!(report["processed"], 0);
    assert_eq!(report["failed"], 0);
}
