use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tokio::task::JoinHandle;

use crate::db::queries;
use crate::state::AppState;

pub const AUTO_CANCEL_REASON: &str = "cancelled by system: pending booking expired";

/// Advances every checked-in booking whose check-out date has passed.
pub fn auto_checkout(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<usize> {
    queries::auto_checkout_overdue(conn, now.date(), now)
}

/// Cancels pending bookings older than `timeout_minutes`.
pub fn auto_cancel_pending(
    conn: &Connection,
    now: NaiveDateTime,
    timeout_minutes: i64,
) -> anyhow::Result<usize> {
    let cutoff = now - chrono::Duration::minutes(timeout_minutes);
    queries::cancel_stale_pending(conn, cutoff, AUTO_CANCEL_REASON, now)
}

/// The in-process scheduler for both sweeps. A failed tick is logged and
/// retried on the next one; both sweeps are idempotent, so overlapping a
/// manual `/api/system` invocation is harmless.
pub struct Sweeper {
    handles: Vec<JoinHandle<()>>,
}

impl Sweeper {
    pub fn start(state: Arc<AppState>) -> Self {
        let checkout = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(Duration::from_secs(state.config.auto_checkout_interval_secs));
                loop {
                    ticker.tick().await;
                    let result = {
                        let db = state.db.lock().unwrap();
                        auto_checkout(&db, chrono::Utc::now().naive_utc())
                    };
                    match result {
                        Ok(0) => {}
                        Ok(n) => tracing::info!("auto-checkout sweep advanced {n} bookings"),
                        Err(e) => tracing::error!("auto-checkout sweep failed: {e}"),
                    }
                }
            })
        };

        let cancel = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(Duration::from_secs(state.config.auto_cancel_interval_secs));
                loop {
                    ticker.tick().await;
                    let result = {
                        let db = state.db.lock().unwrap();
                        auto_cancel_pending(
                            &db,
                            chrono::Utc::now().naive_utc(),
                            state.config.pending_timeout_minutes,
                        )
                    };
                    match result {
                        Ok(0) => {}
                        Ok(n) => tracing::info!("auto-cancel sweep cancelled {n} stale bookings"),
                        Err(e) => tracing::error!("auto-cancel sweep failed: {e}"),
                    }
                }
            })
        };

        Self {
            handles: vec![checkout, cancel],
        }
    }

    pub fn stop(self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus};
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed_booking(
        conn: &Connection,
        check_in: &str,
        check_out: &str,
        status: BookingStatus,
        created_at: NaiveDateTime,
    ) -> String {
        let hotel = queries::create_hotel(conn, "Sweep Hotel").unwrap();
        let rt = queries::create_room_type(conn, hotel.id, "Standard", 100.0, None).unwrap();
        let room = queries::create_room(conn, hotel.id, rt.id, &Uuid::new_v4().to_string()).unwrap();

        let id = Uuid::new_v4().to_string();
        queries::insert_booking(
            conn,
            &Booking {
                id: id.clone(),
                hotel_id: hotel.id,
                room_type_id: rt.id,
                room_id: Some(room.id),
                offer_id: None,
                user_id: "user-1".to_string(),
                check_in: date(check_in),
                check_out: date(check_out),
                guest_count: 1,
                total_price: 100.0,
                status,
                cancel_reason: None,
                checked_out_at: None,
                created_at,
                updated_at: created_at,
            },
        )
        .unwrap();
        id
    }

    #[test]
    fn test_auto_checkout_advances_overdue_only() {
        let conn = setup_db();
        let now = dt("2024-06-10 09:00");

        let overdue = seed_booking(&conn, "2024-06-01", "2024-06-05", BookingStatus::CheckedIn, now);
        // Checks out today: not overdue yet ("strictly before today").
        let today = seed_booking(&conn, "2024-06-08", "2024-06-10", BookingStatus::CheckedIn, now);
        // Overdue date but not checked in: the sweep must not touch it.
        let pending = seed_booking(&conn, "2024-06-01", "2024-06-05", BookingStatus::Confirmed, now);

        let affected = auto_checkout(&conn, now).unwrap();
        assert_eq!(affected, 1);

        let overdue = queries::get_booking(&conn, &overdue).unwrap().unwrap();
        assert_eq!(overdue.status, BookingStatus::CheckedOut);
        assert!(overdue.checked_out_at.is_some());

        let today = queries::get_booking(&conn, &today).unwrap().unwrap();
        assert_eq!(today.status, BookingStatus::CheckedIn);

        let pending = queries::get_booking(&conn, &pending).unwrap().unwrap();
        assert_eq!(pending.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_auto_checkout_idempotent() {
        let conn = setup_db();
        let now = dt("2024-06-10 09:00");
        seed_booking(&conn, "2024-06-01", "2024-06-05", BookingStatus::CheckedIn, now);

        assert_eq!(auto_checkout(&conn, now).unwrap(), 1);
        assert_eq!(auto_checkout(&conn, now).unwrap(), 0);
    }

    #[test]
    fn test_auto_cancel_pending_uses_timeout() {
        let conn = setup_db();
        let now = dt("2024-06-10 12:00");

        let stale = seed_booking(
            &conn,
            "2024-07-01",
            "2024-07-03",
            BookingStatus::Pending,
            dt("2024-06-10 11:30"),
        );
        let fresh = seed_booking(
            &conn,
            "2024-07-01",
            "2024-07-03",
            BookingStatus::Pending,
            dt("2024-06-10 11:50"),
        );

        let affected = auto_cancel_pending(&conn, now, 15).unwrap();
        assert_eq!(affected, 1);

        let stale = queries::get_booking(&conn, &stale).unwrap().unwrap();
        assert_eq!(stale.status, BookingStatus::Cancelled);
        assert_eq!(stale.cancel_reason.as_deref(), Some(AUTO_CANCEL_REASON));

        let fresh = queries::get_booking(&conn, &fresh).unwrap().unwrap();
        assert_eq!(fresh.status, BookingStatus::Pending);
    }

    #[test]
    fn test_auto_cancel_idempotent() {
        let conn = setup_db();
        let now = dt("2024-06-10 12:00");
        seed_booking(
            &conn,
            "2024-07-01",
            "2024-07-03",
            BookingStatus::Pending,
            dt("2024-06-10 10:00"),
        );

        assert_eq!(auto_cancel_pending(&conn, now, 15).unwrap(), 1);
        assert_eq!(auto_cancel_pending(&conn, now, 15).unwrap(), 0);
    }

    #[test]
    fn test_auto_cancel_ignores_confirmed() {
        let conn = setup_db();
        let now = dt("2024-06-10 12:00");
        let confirmed = seed_booking(
            &conn,
            "2024-07-01",
            "2024-07-03",
            BookingStatus::Confirmed,
            dt("2024-06-01 10:00"),
        );

        assert_eq!(auto_cancel_pending(&conn, now, 15).unwrap(), 0);
        let confirmed = queries::get_booking(&conn, &confirmed).unwrap().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_sweeper_start_stop() {
        use crate::config::AppConfig;
        use std::sync::Mutex;

        let state = Arc::new(AppState {
            db: Arc::new(Mutex::new(setup_db())),
            config: AppConfig {
                port: 0,
                database_url: ":memory:".to_string(),
                admin_token: "t".to_string(),
                pending_timeout_minutes: 15,
                auto_checkout_interval_secs: 3600,
                auto_cancel_interval_secs: 3600,
            },
        });

        let sweeper = Sweeper::start(Arc::clone(&state));
        // Give the first (immediate) ticks a chance to run, then shut down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.stop();
    }
}
