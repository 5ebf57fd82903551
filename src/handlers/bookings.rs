use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::envelope;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::booking::{self, BookRoomRequest};
use crate::state::AppState;

// POST /api/bookings
pub async fn book_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.guest_count < 1 {
        return Err(AppError::Validation(
            "guest_count must be at least 1".to_string(),
        ));
    }

    let mut db = state.db.lock().unwrap();

    let room_type = queries::get_room_type(&db, req.room_type_id)?
        .ok_or_else(|| AppError::NotFound(format!("room type {}", req.room_type_id)))?;
    if room_type.hotel_id != req.hotel_id {
        return Err(AppError::NotFound(format!(
            "room type {} in hotel {}",
            req.room_type_id, req.hotel_id
        )));
    }

    let booking = booking::book_room_with_lock(&mut db, &req)?;
    Ok((StatusCode::CREATED, envelope("room booked", booking)))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let booking =
        queries::get_booking(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(envelope("booking found", booking))
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListBookingsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);

    let db = state.db.lock().unwrap();
    let bookings = match q.user_id {
        Some(user_id) => queries::list_bookings_for_user(&db, &user_id)?,
        None => queries::list_bookings(&db, q.status.as_deref(), limit)?,
    };
    Ok(envelope("bookings listed", bookings))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = booking::transition_booking(&db, &id, BookingStatus::Confirmed)?;
    Ok(envelope("booking confirmed", booking))
}

// POST /api/bookings/:id/check-in
pub async fn check_in_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = booking::transition_booking(&db, &id, BookingStatus::CheckedIn)?;
    Ok(envelope("guest checked in", booking))
}

// POST /api/bookings/:id/check-out
pub async fn check_out_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = booking::transition_booking(&db, &id, BookingStatus::CheckedOut)?;
    Ok(envelope("guest checked out", booking))
}

#[derive(Deserialize, Default)]
pub struct CancelBody {
    pub reason: Option<String>,
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let db = state.db.lock().unwrap();
    let booking = booking::cancel_booking(&db, &id, body.reason.as_deref())?;
    Ok(envelope("booking cancelled", booking))
}
