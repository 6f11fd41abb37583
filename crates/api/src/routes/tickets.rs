//! Ticket booking and availability endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use booking::{AvailabilityService, BookingManager};
use chrono::{DateTime, Utc};
use common::{PostId, UserId};
use ledger::{Availability, TicketStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: TicketStore> {
    pub manager: BookingManager<S>,
    pub availability: AvailabilityService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct BatchQuery {
    /// Comma-separated post IDs.
    pub ids: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingResponse {
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub limit: u32,
    pub booked: u32,
    pub available: u32,
    pub is_available: bool,
}

impl From<Availability> for AvailabilityResponse {
    fn from(a: Availability) -> Self {
        Self {
            limit: a.limit,
            booked: a.booked,
            available: a.available,
            is_available: a.is_available,
        }
    }
}

// -- Extraction helpers --

/// Reads the authenticated identity supplied by the upstream auth layer.
///
/// The engine trusts the caller has already verified credentials; this only
/// parses the forwarded `X-User-Id` header.
fn user_from_headers(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))?;

    let uuid = uuid::Uuid::parse_str(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid X-User-Id: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

fn parse_post_id(id: &str) -> Result<PostId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid post id: {e}")))?;
    Ok(PostId::from_uuid(uuid))
}

// -- Handlers --

/// POST /posts/:id/book — reserve one ticket for the calling user.
#[tracing::instrument(skip(state, headers))]
pub async fn book<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let user_id = user_from_headers(&headers)?;
    let post_id = parse_post_id(&id)?;

    let booking = state.manager.reserve(user_id, post_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            post_id: booking.post_id.to_string(),
            user_id: booking.user_id.to_string(),
            created_at: booking.created_at,
        }),
    ))
}

/// DELETE /posts/:id/book — cancel the calling user's ticket.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user_id = user_from_headers(&headers)?;
    let post_id = parse_post_id(&id)?;

    state.manager.cancel(user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/:id/availability — availability snapshot for one post.
#[tracing::instrument(skip(state))]
pub async fn availability<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let post_id = parse_post_id(&id)?;
    let snapshot = state.availability.availability_of(post_id).await?;
    Ok(Json(snapshot.into()))
}

/// GET /posts/availability?ids=a,b,c — availability snapshots for list views.
///
/// Unknown post IDs are omitted from the response.
#[tracing::instrument(skip(state, query))]
pub async fn availability_batch<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<HashMap<String, AvailabilityResponse>>, ApiError> {
    let post_ids = query
        .ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_post_id(s.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let snapshots = state.availability.availability_of_many(&post_ids).await?;

    Ok(Json(
        snapshots
            .into_iter()
            .map(|(post_id, snapshot)| (post_id.to_string(), snapshot.into()))
            .collect(),
    ))
}

/// GET /tickets — posts the calling user currently holds a ticket for.
#[tracing::instrument(skip(state, headers))]
pub async fn my_tickets<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    let user_id = user_from_headers(&headers)?;
    let tickets = state.availability.tickets_of(user_id).await?;
    Ok(Json(tickets.iter().map(|id| id.to_string()).collect()))
}
