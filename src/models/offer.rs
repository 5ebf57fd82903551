use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A time-boxed, quantity-limited discount on a room type. `available_rooms`
/// is the offer's own counter, independent of physical room occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionOffer {
    pub id: i64,
    pub hotel_id: i64,
    pub room_type_id: i64,
    pub discounted_price: f64,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl PromotionOffer {
    /// Active, inside its `[start_time, end_time)` window, with rooms left.
    pub fn is_bookable_at(&self, now: NaiveDateTime) -> bool {
        self.is_active
            && self.start_time <= now
            && now < self.end_time
            && self.available_rooms > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn offer() -> PromotionOffer {
        PromotionOffer {
            id: 1,
            hotel_id: 1,
            room_type_id: 1,
            discounted_price: 80.0,
            total_rooms: 3,
            available_rooms: 3,
            start_time: dt("2025-06-01 00:00"),
            end_time: dt("2025-06-30 00:00"),
            is_active: true,
            created_at: dt("2025-05-20 12:00"),
        }
    }

    #[test]
    fn test_bookable_within_window() {
        assert!(offer().is_bookable_at(dt("2025-06-15 12:00")));
        // start is inclusive, end is exclusive
        assert!(offer().is_bookable_at(dt("2025-06-01 00:00")));
        assert!(!offer().is_bookable_at(dt("2025-06-30 00:00")));
    }

    #[test]
    fn test_not_bookable_outside_window() {
        assert!(!offer().is_bookable_at(dt("2025-05-31 23:59")));
        assert!(!offer().is_bookable_at(dt("2025-07-01 00:00")));
    }

    #[test]
    fn test_not_bookable_when_inactive_or_exhausted() {
        let mut o = offer();
        o.is_active = false;
        assert!(!o.is_bookable_at(dt("2025-06-15 12:00")));

        let mut o = offer();
        o.available_rooms = 0;
        assert!(!o.is_bookable_at(dt("2025-06-15 12:00")));
    }
}
