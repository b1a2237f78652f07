//! Storage seams for the reservation core.
//!
//! The engine only ever talks to these traits. `memory` backs tests and
//! single-process demos, `postgres` is the durable multi-process store.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{seat::join_labels, Booking, Movie, SeatId, SessionKey};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryLedger, MemoryUserDirectory, StaticCatalogStore};
pub use postgres::{PgCatalogStore, PgLedger, PgUserDirectory};

/// Persistence failures. These abort the current operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("seats already claimed for this session: {}", join_labels(.seats, ", "))]
    Conflict { seats: Vec<SeatId> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for CommitError {
    fn from(e: sqlx::Error) -> Self {
        CommitError::Store(StoreError::Database(e))
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("username '{0}' already exists")]
    AlreadyExists(String),
    #[error("user '{0}' not found")]
    NotFound(String),
    #[error("invalid username '{0}'")]
    InvalidUsername(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Append-only booking store; source of truth for seat occupancy.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Union of the seats of every stored booking for `session`.
    async fn booked_seats(&self, session: &SessionKey) -> Result<HashSet<SeatId>, StoreError>;

    /// All bookings of `username`, oldest first.
    async fn bookings_for(&self, username: &str) -> Result<Vec<Booking>, StoreError>;

    /// Compare-and-append: stores `booking` only if none of its seats is
    /// already held by another booking for the same session. Atomic with
    /// respect to concurrent commits on that session.
    async fn commit(&self, booking: &Booking) -> Result<(), CommitError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn register(&self, username: &str) -> Result<(), UserError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_movies(&self) -> Result<Vec<Movie>, StoreError>;
}
