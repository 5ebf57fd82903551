use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::envelope;
use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateHotelBody {
    pub name: String,
}

// POST /api/hotels
pub async fn create_hotel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateHotelBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("hotel name must not be empty".to_string()));
    }

    let db = state.db.lock().unwrap();
    let hotel = queries::create_hotel(&db, body.name.trim())?;
    Ok((StatusCode::CREATED, envelope("hotel created", hotel)))
}

#[derive(Deserialize)]
pub struct CreateRoomTypeBody {
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
}

// POST /api/hotels/:hotel_id/room-types
pub async fn create_room_type(
    State(state): State<Arc<AppState>>,
    Path(hotel_id): Path<i64>,
    Json(body): Json<CreateRoomTypeBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("room type name must not be empty".to_string()));
    }
    if body.base_price < 0.0 {
        return Err(AppError::Validation("base_price must not be negative".to_string()));
    }

    let db = state.db.lock().unwrap();
    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(AppError::NotFound(format!("hotel {hotel_id}")));
    }

    let room_type = queries::create_room_type(
        &db,
        hotel_id,
        body.name.trim(),
        body.base_price,
        body.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, envelope("room type created", room_type)))
}

// GET /api/hotels/:hotel_id/room-types
pub async fn list_room_types(
    State(state): State<Arc<AppState>>,
    Path(hotel_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(AppError::NotFound(format!("hotel {hotel_id}")));
    }

    let room_types = queries::list_room_types(&db, hotel_id)?;
    Ok(envelope("room types listed", room_types))
}

#[derive(Deserialize)]
pub struct CreateRoomBody {
    pub room_number: String,
}

// POST /api/room-types/:room_type_id/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Path(room_type_id): Path<i64>,
    Json(body): Json<CreateRoomBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.room_number.trim().is_empty() {
        return Err(AppError::Validation("room_number must not be empty".to_string()));
    }

    let db = state.db.lock().unwrap();
    let room_type = queries::get_room_type(&db, room_type_id)?
        .ok_or_else(|| AppError::NotFound(format!("room type {room_type_id}")))?;

    let room = queries::create_room(&db, room_type.hotel_id, room_type.id, body.room_number.trim())?;
    Ok((StatusCode::CREATED, envelope("room created", room)))
}

// POST /api/rooms/:id/deactivate
pub async fn deactivate_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    if !queries::deactivate_room(&db, id)? {
        return Err(AppError::NotFound(format!("room {id}")));
    }

    let room = queries::get_room(&db, id)?.ok_or_else(|| AppError::NotFound(format!("room {id}")))?;
    Ok(envelope("room deactivated", room))
}
