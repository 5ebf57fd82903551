use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Booking, BookingStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct BookRoomRequest {
    pub hotel_id: i64,
    pub room_type_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub user_id: String,
    pub guest_count: i32,
    pub total_price: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,

    #[error("no rooms of this type are available for the requested dates")]
    SoldOut,

    #[error("cannot transition a {from} booking to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("booking not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Books one room of the requested type, or reports sold-out.
///
/// The whole check-then-insert runs inside an IMMEDIATE transaction: the
/// write lock is taken before the availability re-check, so a concurrent
/// caller cannot select the same room between our select and our insert.
/// Either the booking row commits or nothing does.
pub fn book_room_with_lock(
    conn: &mut Connection,
    req: &BookRoomRequest,
) -> Result<Booking, BookingError> {
    if req.check_out <= req.check_in {
        return Err(BookingError::InvalidDateRange);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let room_id = match queries::find_free_room(
        &tx,
        req.hotel_id,
        req.room_type_id,
        req.check_in,
        req.check_out,
    )? {
        Some(id) => id,
        None => {
            tx.rollback()?;
            return Err(BookingError::SoldOut);
        }
    };

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        hotel_id: req.hotel_id,
        room_type_id: req.room_type_id,
        room_id: Some(room_id),
        offer_id: None,
        user_id: req.user_id.clone(),
        check_in: req.check_in,
        check_out: req.check_out,
        guest_count: req.guest_count,
        total_price: req.total_price,
        status: BookingStatus::Pending,
        cancel_reason: None,
        checked_out_at: None,
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        room_id,
        "booked room for {} to {}",
        req.check_in,
        req.check_out
    );
    Ok(booking)
}

/// Moves a booking to `next`, enforcing the central transition rules.
/// Check-out stamps `checked_out_at`; cancellation goes through
/// `cancel_booking` so a reason is recorded.
pub fn transition_booking(
    conn: &Connection,
    id: &str,
    next: BookingStatus,
) -> Result<Booking, BookingError> {
    let booking =
        queries::get_booking(conn, id)?.ok_or_else(|| BookingError::NotFound(id.to_string()))?;

    if !booking.status.can_transition_to(next) {
        return Err(BookingError::InvalidTransition {
            from: booking.status.as_str(),
            to: next.as_str(),
        });
    }

    match next {
        BookingStatus::CheckedOut => {
            queries::mark_checked_out(conn, id, Utc::now().naive_utc())?;
        }
        _ => {
            queries::update_booking_status(conn, id, next)?;
        }
    }

    queries::get_booking(conn, id)?.ok_or_else(|| BookingError::NotFound(id.to_string()))
}

pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    reason: Option<&str>,
) -> Result<Booking, BookingError> {
    let booking =
        queries::get_booking(conn, id)?.ok_or_else(|| BookingError::NotFound(id.to_string()))?;

    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(BookingError::InvalidTransition {
            from: booking.status.as_str(),
            to: BookingStatus::Cancelled.as_str(),
        });
    }

    queries::set_booking_cancelled(conn, id, reason)?;
    queries::get_booking(conn, id)?.ok_or_else(|| BookingError::NotFound(id.to_string()))
}
