pub mod booking;
pub mod hotel;
pub mod offer;
pub mod room;

pub use booking::{Booking, BookingStatus};
pub use hotel::Hotel;
pub use offer::PromotionOffer;
pub use room::{Room, RoomType};
