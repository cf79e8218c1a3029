use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod identity;
pub mod resources;
pub mod state;
pub mod webhooks;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/{id}", get(bookings::get_booking))
        .route("/v1/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route("/v1/bookings/{id}/confirm", post(bookings::confirm_booking))
        .route("/v1/bookings/{id}/complete", post(bookings::complete_booking))
        .route("/v1/bookings/{id}/payments", get(bookings::list_payments))
        .route(
            "/v1/resources",
            post(resources::create_resource).get(resources::list_resources),
        )
        .route("/v1/resources/{id}", get(resources::get_resource))
        .route("/v1/resources/{id}/availability", get(resources::get_availability))
        .route("/v1/resources/{id}/bookings", get(bookings::list_for_resource))
        .route("/v1/payments/webhook", post(webhooks::payment_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Telemetry events are structured logs; downstream pipelines key on the
/// `velora::telemetry` target.
pub(crate) fn log_telemetry<T: serde::Serialize>(name: &str, event: &T) {
    match serde_json::to_string(event) {
        Ok(payload) => tracing::info!(target: "velora::telemetry", event = name, %payload),
        Err(e) => tracing::warn!(event = name, error = %e, "failed to serialize telemetry event"),
    }
}
