use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::seat::{join_labels, SeatId};
use crate::seat_grid::SeatGrid;
use crate::store::StoreError;

/// One sellable inventory pool: a movie at a specific showtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub movie_id: String,
    pub showtime: String,
}

impl SessionKey {
    pub fn new(movie_id: impl Into<String>, showtime: impl Into<String>) -> Self {
        Self {
            movie_id: movie_id.into(),
            showtime: showtime.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.movie_id, self.showtime)
    }
}

/// A confirmed booking. Never mutated after it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub username: String,
    #[serde(flatten)]
    pub session: SessionKey,
    pub movie_name: String,
    pub seats: Vec<SeatId>,
    pub total: u64,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        username: impl Into<String>,
        session: SessionKey,
        movie_name: impl Into<String>,
        seats: Vec<SeatId>,
        total: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            session,
            movie_name: movie_name.into(),
            seats,
            total,
            created_at: Utc::now(),
        }
    }

    /// Seat labels in storage form, `A1;A2`.
    pub fn seat_labels(&self) -> String {
        join_labels(&self.seats, ";")
    }
}

// Ledger row as persisted: seats are semicolon-joined labels
#[derive(Debug, Clone, FromRow)]
pub struct BookingRecord {
    pub id: Uuid,
    pub username: String,
    pub movie_id: String,
    pub movie_name: String,
    pub showtime: String,
    pub seats: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Validates the stored row against the hall topology.
    pub fn into_booking(self, grid: &SeatGrid) -> Result<Booking, StoreError> {
        let seats = self
            .seats
            .split(';')
            .map(|label| grid.parse(label.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(format!("booking {}: {}", self.id, e)))?;
        if seats.is_empty() {
            return Err(StoreError::Corrupt(format!("booking {} has no seats", self.id)));
        }
        let total = u64::try_from(self.total)
            .map_err(|_| StoreError::Corrupt(format!("booking {} has negative total", self.id)))?;

        Ok(Booking {
            id: self.id,
            username: self.username,
            session: SessionKey::new(self.movie_id, self.showtime),
            movie_name: self.movie_name,
            seats,
            total,
            created_at: self.created_at,
        })
    }
}
