use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::envelope;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::offers::{self, CreateOfferRequest, OfferBookingRequest};
use crate::state::AppState;

// POST /api/offers
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOfferRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();

    let room_type = queries::get_room_type(&db, req.room_type_id)?
        .ok_or_else(|| AppError::NotFound(format!("room type {}", req.room_type_id)))?;
    if room_type.hotel_id != req.hotel_id {
        return Err(AppError::Validation(format!(
            "room type {} does not belong to hotel {}",
            req.room_type_id, req.hotel_id
        )));
    }

    let offer = offers::create_offer(&db, &req)?;
    Ok((StatusCode::CREATED, envelope("offer created", offer)))
}

#[derive(Deserialize)]
pub struct ListOffersQuery {
    pub hotel_id: Option<i64>,
}

// GET /api/offers
pub async fn list_offers(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListOffersQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let offers = queries::list_active_offers(&db, q.hotel_id)?;
    Ok(envelope("active offers listed", offers))
}

// POST /api/offers/:id/cancel
pub async fn cancel_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let offer = offers::cancel_offer(&db, id)?;
    Ok(envelope("offer cancelled", offer))
}

// POST /api/offers/:id/book
pub async fn book_with_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<OfferBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.adults < 1 {
        return Err(AppError::Validation(
            "at least one adult guest is required".to_string(),
        ));
    }

    let mut db = state.db.lock().unwrap();
    let (booking, offer) =
        offers::book_with_offer(&mut db, id, &req, Utc::now().naive_utc())?;
    Ok((
        StatusCode::CREATED,
        envelope(
            "booked with promotion offer",
            serde_json::json!({ "booking": booking, "offer": offer }),
        ),
    ))
}
