#![allow(dead_code)]

use std::sync::Arc;

use showtime_booking::{
    catalog::Catalog,
    config::Config,
    models::Movie,
    seat_grid::SeatGrid,
    services::{ReservationEngine, ReservationPolicy},
    store::{Ledger, MemoryLedger, MemoryUserDirectory},
    AppState,
};

pub fn movies() -> Vec<Movie> {
    vec![
        movie("M1", "Interstellar", "Sci-Fi", &["10:00 AM", "7:00 PM"], 250),
        movie("M2", "The Dark Knight", "Action", &["6:00 PM"], 220),
        movie("M3", "Arrival", "Sci-Fi", &["12:00 PM"], 200),
    ]
}

pub fn movie(id: &str, name: &str, genre: &str, showtimes: &[&str], price: u32) -> Movie {
    Movie {
        movie_id: id.to_string(),
        name: name.to_string(),
        genre: genre.to_string(),
        screen: "1".to_string(),
        showtimes: showtimes.iter().map(|s| s.to_string()).collect(),
        price,
    }
}

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(movies()).unwrap())
}

pub fn engine_with(ledger: Arc<dyn Ledger>, policy: ReservationPolicy) -> ReservationEngine {
    ReservationEngine::new(catalog(), ledger, SeatGrid::default(), policy)
}

pub fn engine() -> ReservationEngine {
    engine_with(Arc::new(MemoryLedger::new()), ReservationPolicy::default())
}

/// In-memory application with `alice` and `bob` already registered.
pub fn app_state() -> Arc<AppState> {
    AppState::from_parts(
        Config::from_lookup(|_| None).unwrap(),
        Catalog::new(movies()).unwrap(),
        Arc::new(MemoryLedger::new()),
        Arc::new(MemoryUserDirectory::with_users(["alice", "bob"])),
        SeatGrid::default(),
        None,
    )
}
