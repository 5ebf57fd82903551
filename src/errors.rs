use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::availability::AvailabilityError;
use crate::services::booking::BookingError;
use crate::services::offers::OfferError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    SoldOut(String),

    #[error("{0}")]
    OfferUnavailable(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::SoldOut(_) | AppError::OfferUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }

        let body = serde_json::json!({ "success": false, "message": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::InvalidDateRange => AppError::Validation(err.to_string()),
            AvailabilityError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SoldOut => AppError::SoldOut(err.to_string()),
            BookingError::InvalidDateRange | BookingError::InvalidTransition { .. } => {
                AppError::Validation(err.to_string())
            }
            BookingError::NotFound(id) => AppError::NotFound(format!("booking {id}")),
            BookingError::Database(e) => AppError::Database(e),
            BookingError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<OfferError> for AppError {
    fn from(err: OfferError) -> Self {
        match err {
            OfferError::Unavailable => AppError::OfferUnavailable(err.to_string()),
            OfferError::InvalidDateRange | OfferError::InvalidOffer(_) => {
                AppError::Validation(err.to_string())
            }
            OfferError::NotFound(id) => AppError::NotFound(format!("offer {id}")),
            OfferError::Database(e) => AppError::Database(e),
            OfferError::Internal(e) => AppError::Internal(e),
        }
    }
}
