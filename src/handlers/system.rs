use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use super::envelope;
use crate::errors::AppError;
use crate::services::maintenance;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/system/auto-checkout
pub async fn auto_checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let affected = {
        let db = state.db.lock().unwrap();
        maintenance::auto_checkout(&db, Utc::now().naive_utc())?
    };
    Ok(envelope(
        "auto-checkout sweep complete",
        serde_json::json!({ "affected": affected }),
    ))
}

// POST /api/system/auto-cancel-pending
pub async fn auto_cancel_pending(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let affected = {
        let db = state.db.lock().unwrap();
        maintenance::auto_cancel_pending(
            &db,
            Utc::now().naive_utc(),
            state.config.pending_timeout_minutes,
        )?
    };
    Ok(envelope(
        "auto-cancel sweep complete",
        serde_json::json!({ "affected": affected }),
    ))
}
