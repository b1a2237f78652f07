pub mod accounts;
pub mod reservation;

pub use accounts::Accounts;
pub use reservation::{
    Availability, AutoConfirm, Confirmer, Quote, Reservation, ReservationEngine, ReservationError,
    ReservationPolicy,
};
