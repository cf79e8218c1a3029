use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use velora_booking::BookingError;

#[derive(Debug)]
pub enum ApiError {
    Domain(BookingError),
    Unauthenticated(String),
    BadRequest(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Domain(err) => domain_response(err),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Callers display different messaging per kind ("not enough seats" vs
/// "too late to cancel"), so every business rejection keeps a distinct
/// machine-readable code.
fn domain_response(err: BookingError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        BookingError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND", message),
        BookingError::BookingNotFound(_) => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND", message),
        BookingError::ResourceUnavailable(_) => {
            (StatusCode::CONFLICT, "RESOURCE_UNAVAILABLE", message)
        }
        BookingError::InsufficientCapacity(_) => {
            (StatusCode::CONFLICT, "INSUFFICIENT_CAPACITY", message)
        }
        BookingError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", message)
        }
        BookingError::CancellationWindowClosed { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "CANCELLATION_WINDOW_CLOSED",
            message,
        ),
        BookingError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED", message),
        BookingError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION", message),
        BookingError::PersistenceConflict(_) => {
            (StatusCode::CONFLICT, "PERSISTENCE_CONFLICT", message)
        }
        BookingError::ReferenceCollision
        | BookingError::Repository(_)
        | BookingError::Internal(_) => {
            tracing::error!("Internal Server Error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal Server Error".to_string(),
            )
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
