use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, PromotionOffer};

#[derive(Debug, Clone, Deserialize)]
pub struct OfferBookingRequest {
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOfferRequest {
    pub hotel_id: i64,
    pub room_type_id: i64,
    pub discounted_price: f64,
    pub total_rooms: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("this offer is not currently available")]
    Unavailable,

    #[error("check-out must be after check-in")]
    InvalidDateRange,

    #[error("{0}")]
    InvalidOffer(String),

    #[error("offer not found: {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub fn create_offer(
    conn: &Connection,
    req: &CreateOfferRequest,
) -> Result<PromotionOffer, OfferError> {
    if req.total_rooms <= 0 {
        return Err(OfferError::InvalidOffer(
            "an offer must cover at least one room".to_string(),
        ));
    }
    if req.end_time <= req.start_time {
        return Err(OfferError::InvalidOffer(
            "offer end time must be after its start time".to_string(),
        ));
    }

    let offer = queries::insert_offer(
        conn,
        req.hotel_id,
        req.room_type_id,
        req.discounted_price,
        req.total_rooms,
        req.start_time,
        req.end_time,
    )?;
    Ok(offer)
}

pub fn cancel_offer(conn: &Connection, id: i64) -> Result<PromotionOffer, OfferError> {
    if queries::get_offer(conn, id)?.is_none() {
        return Err(OfferError::NotFound(id));
    }
    queries::deactivate_offer(conn, id)?;
    queries::get_offer(conn, id)?.ok_or(OfferError::NotFound(id))
}

/// Books against a promotion offer: the discounted room is considered
/// pre-reserved by the offer itself, so the booking is inserted directly as
/// confirmed (no pending stage) with no physical room assigned.
///
/// The offer re-read, the booking insert and the counter decrement share one
/// IMMEDIATE transaction; either both writes commit or neither does.
pub fn book_with_offer(
    conn: &mut Connection,
    offer_id: i64,
    req: &OfferBookingRequest,
    now: NaiveDateTime,
) -> Result<(Booking, PromotionOffer), OfferError> {
    if req.check_out <= req.check_in {
        return Err(OfferError::InvalidDateRange);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let offer = match queries::get_offer(&tx, offer_id)? {
        Some(offer) => offer,
        None => {
            tx.rollback()?;
            return Err(OfferError::NotFound(offer_id));
        }
    };
    if !offer.is_bookable_at(now) {
        tx.rollback()?;
        return Err(OfferError::Unavailable);
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        hotel_id: offer.hotel_id,
        room_type_id: offer.room_type_id,
        room_id: None,
        offer_id: Some(offer.id),
        user_id: req.user_id.clone(),
        check_in: req.check_in,
        check_out: req.check_out,
        guest_count: req.adults + req.children,
        total_price: offer.discounted_price,
        status: BookingStatus::Confirmed,
        cancel_reason: None,
        checked_out_at: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&tx, &booking)?;

    if !queries::decrement_offer_rooms(&tx, offer_id)? {
        // The bookable check above saw rooms left, so this only happens if
        // the counter was already at zero; bail without committing anything.
        tx.rollback()?;
        return Err(OfferError::Unavailable);
    }

    let offer = match queries::get_offer(&tx, offer_id)? {
        Some(offer) => offer,
        None => {
            tx.rollback()?;
            return Err(OfferError::NotFound(offer_id));
        }
    };
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        offer_id,
        available_rooms = offer.available_rooms,
        "booked with promotion offer"
    );
    Ok((booking, offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed_offer(conn: &Connection, total_rooms: i32) -> PromotionOffer {
        let hotel = queries::create_hotel(conn, "Offer Hotel").unwrap();
        let rt = queries::create_room_type(conn, hotel.id, "Deluxe", 180.0, None).unwrap();
        create_offer(
            conn,
            &CreateOfferRequest {
                hotel_id: hotel.id,
                room_type_id: rt.id,
                discounted_price: 120.0,
                total_rooms,
                start_time: dt("2024-06-01 00:00"),
                end_time: dt("2024-06-30 00:00"),
            },
        )
        .unwrap()
    }

    fn booking_request() -> OfferBookingRequest {
        OfferBookingRequest {
            user_id: "user-1".to_string(),
            check_in: date("2024-06-10"),
            check_out: date("2024-06-12"),
            adults: 2,
            children: 1,
        }
    }

    #[test]
    fn test_book_with_offer_confirms_and_decrements() {
        let mut conn = setup_db();
        let offer = seed_offer(&conn, 3);

        let (booking, offer) =
            book_with_offer(&mut conn, offer.id, &booking_request(), dt("2024-06-10 09:00"))
                .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.room_id, None);
        assert_eq!(booking.offer_id, Some(offer.id));
        assert_eq!(booking.total_price, 120.0);
        assert_eq!(booking.guest_count, 3);
        assert_eq!(offer.available_rooms, 2);
        assert!(offer.is_active);
    }

    #[test]
    fn test_exhaustion_flips_is_active_exactly_at_zero() {
        let mut conn = setup_db();
        let offer = seed_offer(&conn, 2);
        let now = dt("2024-06-10 09:00");

        let (_, o) = book_with_offer(&mut conn, offer.id, &booking_request(), now).unwrap();
        assert_eq!(o.available_rooms, 1);
        assert!(o.is_active);

        let (_, o) = book_with_offer(&mut conn, offer.id, &booking_request(), now).unwrap();
        assert_eq!(o.available_rooms, 0);
        assert!(!o.is_active);

        // Counter never goes negative: the next attempt is rejected outright.
        let result = book_with_offer(&mut conn, offer.id, &booking_request(), now);
        assert!(matches!(result, Err(OfferError::Unavailable)));

        let o = queries::get_offer(&conn, offer.id).unwrap().unwrap();
        assert_eq!(o.available_rooms, 0);
    }

    #[test]
    fn test_rejected_outside_window() {
        let mut conn = setup_db();
        let offer = seed_offer(&conn, 2);

        let result = book_with_offer(&mut conn, offer.id, &booking_request(), dt("2024-05-31 23:00"));
        assert!(matches!(result, Err(OfferError::Unavailable)));

        let result = book_with_offer(&mut conn, offer.id, &booking_request(), dt("2024-06-30 00:00"));
        assert!(matches!(result, Err(OfferError::Unavailable)));

        // Nothing was inserted on either rejection.
        assert!(queries::list_bookings(&conn, None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_offer_not_bookable() {
        let mut conn = setup_db();
        let offer = seed_offer(&conn, 2);

        let cancelled = cancel_offer(&conn, offer.id).unwrap();
        assert!(!cancelled.is_active);

        let result =
            book_with_offer(&mut conn, offer.id, &booking_request(), dt("2024-06-10 09:00"));
        assert!(matches!(result, Err(OfferError::Unavailable)));
    }

    #[test]
    fn test_offer_booking_does_not_consume_room_inventory() {
        let mut conn = setup_db();
        let offer = seed_offer(&conn, 1);
        // One physical room of the offered type.
        queries::create_room(&conn, offer.hotel_id, offer.room_type_id, "500").unwrap();

        book_with_offer(&mut conn, offer.id, &booking_request(), dt("2024-06-10 09:00")).unwrap();

        // The offer booking carries no room_id, so per-room availability for
        // the same dates is untouched.
        let report = crate::services::availability::room_type_availability(
            &conn,
            offer.hotel_id,
            offer.room_type_id,
            date("2024-06-10"),
            date("2024-06-12"),
        )
        .unwrap();
        assert_eq!(report.booked_rooms, 0);
        assert_eq!(report.available_rooms, 1);
    }

    #[test]
    fn test_create_offer_validation() {
        let conn = setup_db();
        let hotel = queries::create_hotel(&conn, "H").unwrap();
        let rt = queries::create_room_type(&conn, hotel.id, "Standard", 90.0, None).unwrap();

        let result = create_offer(
            &conn,
            &CreateOfferRequest {
                hotel_id: hotel.id,
                room_type_id: rt.id,
                discounted_price: 50.0,
                total_rooms: 0,
                start_time: dt("2024-06-01 00:00"),
                end_time: dt("2024-06-30 00:00"),
            },
        );
        assert!(matches!(result, Err(OfferError::InvalidOffer(_))));

        let result = create_offer(
            &conn,
            &CreateOfferRequest {
                hotel_id: hotel.id,
                room_type_id: rt.id,
                discounted_price: 50.0,
                total_rooms: 2,
                start_time: dt("2024-06-30 00:00"),
                end_time: dt("2024-06-01 00:00"),
            },
        );
        assert!(matches!(result, Err(OfferError::InvalidOffer(_))));
    }

    #[test]
    fn test_unknown_offer_not_found() {
        let mut conn = setup_db();
        let result = book_with_offer(&mut conn, 999, &booking_request(), dt("2024-06-10 09:00"));
        assert!(matches!(result, Err(OfferError::NotFound(999))));
    }
}
