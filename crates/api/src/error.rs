//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::TicketError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Booking engine error.
    Ticket(TicketError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Ticket(err) => ticket_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn ticket_error_to_response(err: TicketError) -> (StatusCode, String) {
    match &err {
        TicketError::PostNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        // Matches the original API contract: duplicate bookings are a 400
        TicketError::AlreadyBooked { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        TicketError::SoldOut { .. } => (StatusCode::CONFLICT, err.to_string()),
        TicketError::NotBooked { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        TicketError::Database(_) | TicketError::Migration(_) => {
            tracing::error!(error = %err, "storage fault");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage failure".to_string(),
            )
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        ApiError::Ticket(err)
    }
}
