use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;

/// Availability of one room type over a `[check_in, check_out)` range.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub total_rooms: i64,
    pub booked_rooms: i64,
    pub available_rooms: i64,
}

/// Hotel-wide availability row, one per room type, with the UI warning flags.
#[derive(Debug, Clone, Serialize)]
pub struct RoomTypeAvailability {
    pub room_type_id: i64,
    pub room_type_name: String,
    pub base_price: f64,
    pub total_rooms: i64,
    pub booked_rooms: i64,
    pub available_rooms: i64,
    pub is_low_availability: bool,
    pub is_sold_out: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

pub fn validate_stay(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), AvailabilityError> {
    if check_out <= check_in {
        return Err(AvailabilityError::InvalidDateRange);
    }
    Ok(())
}

/// Read-only availability for one room type. `available_rooms` is floored at
/// zero: a room deactivated while still carrying a live booking counts as
/// booked but not as inventory.
pub fn room_type_availability(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<AvailabilityReport, AvailabilityError> {
    validate_stay(check_in, check_out)?;

    let total_rooms = queries::count_active_rooms(conn, hotel_id, room_type_id)?;
    let booked_rooms =
        queries::count_booked_rooms(conn, hotel_id, room_type_id, check_in, check_out)?;

    Ok(AvailabilityReport {
        total_rooms,
        booked_rooms,
        available_rooms: (total_rooms - booked_rooms).max(0),
    })
}

/// Availability across every room type of a hotel.
pub fn hotel_availability(
    conn: &Connection,
    hotel_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Vec<RoomTypeAvailability>, AvailabilityError> {
    validate_stay(check_in, check_out)?;

    let room_types = queries::list_room_types(conn, hotel_id)?;

    let mut result = Vec::with_capacity(room_types.len());
    for rt in room_types {
        let report = room_type_availability(conn, hotel_id, rt.id, check_in, check_out)?;
        result.push(RoomTypeAvailability {
            room_type_id: rt.id,
            room_type_name: rt.name,
            base_price: rt.base_price,
            total_rooms: report.total_rooms,
            booked_rooms: report.booked_rooms,
            available_rooms: report.available_rooms,
            is_low_availability: report.available_rooms > 0 && report.available_rooms <= 2,
            is_sold_out: report.available_rooms == 0,
        });
    }
    Ok(result)
}
