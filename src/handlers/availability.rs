use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::envelope;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::availability;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StayQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

// GET /api/hotels/:hotel_id/availability
pub async fn hotel_availability(
    State(state): State<Arc<AppState>>,
    Path(hotel_id): Path<i64>,
    Query(q): Query<StayQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();

    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(AppError::NotFound(format!("hotel {hotel_id}")));
    }

    let rows = availability::hotel_availability(&db, hotel_id, q.check_in, q.check_out)?;
    Ok(envelope("availability computed", rows))
}

// GET /api/hotels/:hotel_id/room-types/:room_type_id/availability
pub async fn room_type_availability(
    State(state): State<Arc<AppState>>,
    Path((hotel_id, room_type_id)): Path<(i64, i64)>,
    Query(q): Query<StayQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();

    let room_type = queries::get_room_type(&db, room_type_id)?
        .ok_or_else(|| AppError::NotFound(format!("room type {room_type_id}")))?;
    if room_type.hotel_id != hotel_id {
        return Err(AppError::NotFound(format!(
            "room type {room_type_id} in hotel {hotel_id}"
        )));
    }

    let report =
        availability::room_type_availability(&db, hotel_id, room_type_id, q.check_in, q.check_out)?;
    Ok(envelope("availability computed", report))
}
