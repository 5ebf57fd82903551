use axum::Json;
use serde::Serialize;

pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod offers;
pub mod system;

/// Standard response envelope: `{"success": true, "message": ..., "data": ...}`.
pub fn envelope<T: Serialize>(message: &str, data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}
