pub mod booking;
pub mod movie;
pub mod seat;
pub mod user;

pub use booking::{Booking, BookingRecord, SessionKey};
pub use movie::{Movie, MovieRecord};
pub use seat::{SeatId, SeatMarker};
