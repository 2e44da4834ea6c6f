pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let verification_routes = Router::new()
        .route("/send", post(routes::verification::send))
        .route("/verify", post(routes::verification::verify));

    let email_change_routes = Router::new()
        .route("/request", post(routes::email_change::request))
        .route("/confirm", get(routes::email_change::confirm))
        .route("/finalize", post(routes::email_change::finalize));

    // Webhook is signature-authenticated over the raw body; the rest are
    // operator endpoints.
    let payout_routes = Router::new()
        .route("/initiate", post(routes::payouts::initiate))
        .route("/webhook", post(routes::payouts::webhook))
        .route("/refund", post(routes::payouts::refund))
        .route("/beneficiary", post(routes::payouts::beneficiary));

    let lookup_routes = Router::new()
        .route("/boarders", get(routes::lookup::boarders))
        .route("/availability", get(routes::lookup::availability))
        .route("/pricing", get(routes::lookup::pricing))
        .route("/account", get(routes::lookup::account));

    let api = Router::new()
        .route("/events", post(routes::events::ingest))
        .nest("/verification", verification_routes)
        .nest("/email-change", email_change_routes)
        .nest("/payouts", payout_routes)
        .nest("/lookup", lookup_routes);

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
