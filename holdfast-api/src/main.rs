use std::net::SocketAddr;
use std::sync::Arc;

use holdfast_api::{app, config::Config, AppState};
use holdfast_core::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "holdfast_api=debug,holdfast_order=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Holdfast API on port {}", config.server.port);

    let state = AppState::new(
        Arc::new(SystemClock),
        chrono::Duration::seconds(config.reservation.payment_grace_seconds as i64),
    );

    tokio::spawn(
        state
            .reclaimer
            .clone()
            .run(std::time::Duration::from_secs(
                config.reservation.reclaim_interval_seconds,
            )),
    );

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
