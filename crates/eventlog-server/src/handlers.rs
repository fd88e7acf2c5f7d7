//! HTTP handlers for the event routes.
//!
//! Each handler takes the injected [`AppState`], calls into the repo, and
//! shapes the result with [`crate::wire`]. Store access is synchronous and
//! scoped to a single repo call.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eventlog_core::events::{EventSummary, NewEvent};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::server::AppState;
use crate::wire;

/// `GET /events?skip=&limit=&severity=&eventType=&source=&startDate=&endDate=`
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = state.limits.resolve(&params)?;
    let filter = params.filter()?;
    let events = state.repo.list_filtered(&filter, page.offset, page.limit)?;
    Ok(Json(wire::events_to_wire(&events)?))
}

/// `POST /events`
pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = body?;
    let record = state.repo.create(event)?;
    info!(event_id = %record.id, event_type = ?record.event_type, "event created");
    Ok(Json(wire::event_to_wire(&record)?))
}

/// `GET /events/count`
pub async fn count_events(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let total = state.repo.count()?;
    Ok(Json(wire::count_to_wire(total)))
}

/// `GET /events/summary`
pub async fn event_summary(
    State(state): State<AppState>,
) -> Result<Json<EventSummary>, ApiError> {
    Ok(Json(state.repo.summary()?))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unhealthy" })),
            )
        }
    }
}
