use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, Hotel, PromotionOffer, Room, RoomType};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// Must stay in sync with BookingStatus::is_blocking.
const BLOCKING_STATUSES: &str = "('pending', 'confirmed', 'checked_in')";

fn now_str() -> String {
    Utc::now().naive_utc().format(DATETIME_FMT).to_string()
}

// ── Hotels ──

pub fn create_hotel(conn: &Connection, name: &str) -> anyhow::Result<Hotel> {
    let now = now_str();
    conn.execute(
        "INSERT INTO hotels (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Hotel {
        id,
        name: name.to_string(),
        created_at: parse_datetime(&now),
    })
}

pub fn get_hotel(conn: &Connection, id: i64) -> anyhow::Result<Option<Hotel>> {
    let result = conn.query_row(
        "SELECT id, name, created_at FROM hotels WHERE id = ?1",
        params![id],
        |row| {
            let created_at: String = row.get(2)?;
            Ok(Hotel {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&created_at),
            })
        },
    );

    match result {
        Ok(hotel) => Ok(Some(hotel)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Room types ──

pub fn create_room_type(
    conn: &Connection,
    hotel_id: i64,
    name: &str,
    base_price: f64,
    description: Option<&str>,
) -> anyhow::Result<RoomType> {
    conn.execute(
        "INSERT INTO room_types (hotel_id, name, base_price, description) VALUES (?1, ?2, ?3, ?4)",
        params![hotel_id, name, base_price, description],
    )?;
    Ok(RoomType {
        id: conn.last_insert_rowid(),
        hotel_id,
        name: name.to_string(),
        base_price,
        description: description.map(str::to_string),
    })
}

pub fn get_room_type(conn: &Connection, id: i64) -> anyhow::Result<Option<RoomType>> {
    let result = conn.query_row(
        "SELECT id, hotel_id, name, base_price, description FROM room_types WHERE id = ?1",
        params![id],
        parse_room_type_row,
    );

    match result {
        Ok(rt) => Ok(Some(rt)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_room_types(conn: &Connection, hotel_id: i64) -> anyhow::Result<Vec<RoomType>> {
    let mut stmt = conn.prepare(
        "SELECT id, hotel_id, name, base_price, description
         FROM room_types WHERE hotel_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![hotel_id], parse_room_type_row)?;

    let mut room_types = vec![];
    for row in rows {
        room_types.push(row?);
    }
    Ok(room_types)
}

fn parse_room_type_row(row: &rusqlite::Row) -> rusqlite::Result<RoomType> {
    Ok(RoomType {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        name: row.get(2)?,
        base_price: row.get(3)?,
        description: row.get(4)?,
    })
}

// ── Rooms ──

pub fn create_room(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
    room_number: &str,
) -> anyhow::Result<Room> {
    conn.execute(
        "INSERT INTO rooms (hotel_id, room_type_id, room_number, is_active) VALUES (?1, ?2, ?3, 1)",
        params![hotel_id, room_type_id, room_number],
    )?;
    Ok(Room {
        id: conn.last_insert_rowid(),
        hotel_id,
        room_type_id,
        room_number: room_number.to_string(),
        is_active: true,
    })
}

pub fn get_room(conn: &Connection, id: i64) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        "SELECT id, hotel_id, room_type_id, room_number, is_active FROM rooms WHERE id = ?1",
        params![id],
        |row| {
            Ok(Room {
                id: row.get(0)?,
                hotel_id: row.get(1)?,
                room_type_id: row.get(2)?,
                room_number: row.get(3)?,
                is_active: row.get::<_, i32>(4)? != 0,
            })
        },
    );

    match result {
        Ok(room) => Ok(Some(room)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn deactivate_room(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("UPDATE rooms SET is_active = 0 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Availability ──

pub fn count_active_rooms(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM rooms WHERE hotel_id = ?1 AND room_type_id = ?2 AND is_active = 1",
        params![hotel_id, room_type_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Distinct rooms of the type with at least one blocking booking overlapping
/// `[check_in, check_out)`. Deliberately ignores `rooms.is_active`: a live
/// booking against a deactivated room still occupies it.
pub fn count_booked_rooms(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(DISTINCT room_id) FROM bookings
             WHERE hotel_id = ?1 AND room_type_id = ?2
               AND room_id IS NOT NULL
               AND status IN {BLOCKING_STATUSES}
               AND NOT (?4 <= check_in OR ?3 >= check_out)"
        ),
        params![
            hotel_id,
            room_type_id,
            check_in.format(DATE_FMT).to_string(),
            check_out.format(DATE_FMT).to_string(),
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Lowest-id active room of the type with no overlapping blocking booking.
/// Must be called inside the booking transaction so the answer stays true
/// until the insert commits.
pub fn find_free_room(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<Option<i64>> {
    let result = conn.query_row(
        &format!(
            "SELECT r.id FROM rooms r
             WHERE r.hotel_id = ?1 AND r.room_type_id = ?2 AND r.is_active = 1
               AND NOT EXISTS (
                 SELECT 1 FROM bookings b
                  WHERE b.room_id = r.id
                    AND b.status IN {BLOCKING_STATUSES}
                    AND NOT (?4 <= b.check_in OR ?3 >= b.check_out)
               )
             ORDER BY r.id ASC
             LIMIT 1"
        ),
        params![
            hotel_id,
            room_type_id,
            check_in.format(DATE_FMT).to_string(),
            check_out.format(DATE_FMT).to_string(),
        ],
        |row| row.get(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings
            (id, hotel_id, room_type_id, room_id, offer_id, user_id, check_in, check_out,
             guest_count, total_price, status, cancel_reason, checked_out_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.hotel_id,
            booking.room_type_id,
            booking.room_id,
            booking.offer_id,
            booking.user_id,
            booking.check_in.format(DATE_FMT).to_string(),
            booking.check_out.format(DATE_FMT).to_string(),
            booking.guest_count,
            booking.total_price,
            booking.status.as_str(),
            booking.cancel_reason,
            booking
                .checked_out_at
                .map(|t| t.format(DATETIME_FMT).to_string()),
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

const BOOKING_COLUMNS: &str = "id, hotel_id, room_type_id, room_id, offer_id, user_id, check_in, check_out, \
     guest_count, total_price, status, cancel_reason, checked_out_at, created_at, updated_at";

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut bookings = vec![];
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY created_at DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
    }
    Ok(bookings)
}

pub fn list_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE user_id = ?1 AND status != 'cancelled' ORDER BY check_in ASC"
    ))?;
    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_str(), id],
    )?;
    Ok(count > 0)
}

pub fn mark_checked_out(conn: &Connection, id: &str, at: NaiveDateTime) -> anyhow::Result<bool> {
    let at = at.format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = 'checked_out', checked_out_at = ?1, updated_at = ?1 WHERE id = ?2",
        params![at, id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_cancelled(
    conn: &Connection,
    id: &str,
    reason: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', cancel_reason = ?1, updated_at = ?2 WHERE id = ?3",
        params![reason, now_str(), id],
    )?;
    Ok(count > 0)
}

// ── Maintenance sweeps ──

/// Checked-in bookings whose check-out date has passed become checked-out.
/// Returns the number of rows advanced; a second run finds nothing.
pub fn auto_checkout_overdue(
    conn: &Connection,
    today: NaiveDate,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings
            SET status = 'checked_out', checked_out_at = ?2, updated_at = ?2
          WHERE status = 'checked_in' AND check_out < ?1",
        params![
            today.format(DATE_FMT).to_string(),
            now.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(count)
}

/// Pending bookings created before `cutoff` become cancelled with a
/// system-generated reason. Returns the number of rows cancelled.
pub fn cancel_stale_pending(
    conn: &Connection,
    cutoff: NaiveDateTime,
    reason: &str,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings
            SET status = 'cancelled', cancel_reason = ?2, updated_at = ?3
          WHERE status = 'pending' AND created_at < ?1",
        params![
            cutoff.format(DATETIME_FMT).to_string(),
            reason,
            now.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(count)
}

// ── Promotion offers ──

pub fn insert_offer(
    conn: &Connection,
    hotel_id: i64,
    room_type_id: i64,
    discounted_price: f64,
    total_rooms: i32,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> anyhow::Result<PromotionOffer> {
    let now = now_str();
    conn.execute(
        "INSERT INTO promotion_offers
            (hotel_id, room_type_id, discounted_price, total_rooms, available_rooms,
             start_time, end_time, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, 1, ?7)",
        params![
            hotel_id,
            room_type_id,
            discounted_price,
            total_rooms,
            start_time.format(DATETIME_FMT).to_string(),
            end_time.format(DATETIME_FMT).to_string(),
            now,
        ],
    )?;
    Ok(PromotionOffer {
        id: conn.last_insert_rowid(),
        hotel_id,
        room_type_id,
        discounted_price,
        total_rooms,
        available_rooms: total_rooms,
        start_time,
        end_time,
        is_active: true,
        created_at: parse_datetime(&now),
    })
}

const OFFER_COLUMNS: &str = "id, hotel_id, room_type_id, discounted_price, total_rooms, available_rooms, \
     start_time, end_time, is_active, created_at";

pub fn get_offer(conn: &Connection, id: i64) -> anyhow::Result<Option<PromotionOffer>> {
    let result = conn.query_row(
        &format!("SELECT {OFFER_COLUMNS} FROM promotion_offers WHERE id = ?1"),
        params![id],
        parse_offer_row,
    );

    match result {
        Ok(offer) => Ok(Some(offer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_offers(
    conn: &Connection,
    hotel_id: Option<i64>,
) -> anyhow::Result<Vec<PromotionOffer>> {
    let mut offers = vec![];
    match hotel_id {
        Some(hotel_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OFFER_COLUMNS} FROM promotion_offers
                 WHERE is_active = 1 AND hotel_id = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![hotel_id], parse_offer_row)?;
            for row in rows {
                offers.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OFFER_COLUMNS} FROM promotion_offers WHERE is_active = 1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map([], parse_offer_row)?;
            for row in rows {
                offers.push(row?);
            }
        }
    }
    Ok(offers)
}

pub fn deactivate_offer(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE promotion_offers SET is_active = 0 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

/// Takes one room off the offer's counter, flipping `is_active` in the same
/// statement when the counter reaches zero so the pair can never disagree.
/// Returns false when no room was left to take.
pub fn decrement_offer_rooms(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE promotion_offers
            SET available_rooms = available_rooms - 1,
                is_active = CASE WHEN available_rooms - 1 <= 0 THEN 0 ELSE is_active END
          WHERE id = ?1 AND is_active = 1 AND available_rooms > 0",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_offer_row(row: &rusqlite::Row) -> rusqlite::Result<PromotionOffer> {
    let start_time: String = row.get(6)?;
    let end_time: String = row.get(7)?;
    let created_at: String = row.get(9)?;

    Ok(PromotionOffer {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        room_type_id: row.get(2)?,
        discounted_price: row.get(3)?,
        total_rooms: row.get(4)?,
        available_rooms: row.get(5)?,
        start_time: parse_datetime(&start_time),
        end_time: parse_datetime(&end_time),
        is_active: row.get::<_, i32>(8)? != 0,
        created_at: parse_datetime(&created_at),
    })
}

// ── Row parsing ──

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let hotel_id: i64 = row.get(1)?;
    let room_type_id: i64 = row.get(2)?;
    let room_id: Option<i64> = row.get(3)?;
    let offer_id: Option<i64> = row.get(4)?;
    let user_id: String = row.get(5)?;
    let check_in: String = row.get(6)?;
    let check_out: String = row.get(7)?;
    let guest_count: i32 = row.get(8)?;
    let total_price: f64 = row.get(9)?;
    let status: String = row.get(10)?;
    let cancel_reason: Option<String> = row.get(11)?;
    let checked_out_at: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Booking {
        id,
        hotel_id,
        room_type_id,
        room_id,
        offer_id,
        user_id,
        check_in: parse_date(&check_in),
        check_out: parse_date(&check_out),
        guest_count,
        total_price,
        status: BookingStatus::parse(&status),
        cancel_reason,
        checked_out_at: checked_out_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}
