use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;

use super::{CatalogStore, CommitError, Ledger, StoreError, UserDirectory, UserError};
use crate::models::{Booking, Movie, MovieRecord, SeatId, SessionKey};

#[derive(Default)]
struct LedgerState {
    bookings: Vec<Booking>,
    // session -> every seat claimed so far; kept in step with `bookings`
    claimed: HashMap<SessionKey, HashSet<SeatId>>,
}

/// In-process ledger. The check and the append of `commit` happen under
/// one write lock.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn booked_seats(&self, session: &SessionKey) -> Result<HashSet<SeatId>, StoreError> {
        let state = self.state.read().await;
        Ok(state.claimed.get(session).cloned().unwrap_or_default())
    }

    async fn bookings_for(&self, username: &str) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.username == username)
            .cloned()
            .collect())
    }

    async fn commit(&self, booking: &Booking) -> Result<(), CommitError> {
        let mut state = self.state.write().await;

        if let Some(claimed) = state.claimed.get(&booking.session) {
            let taken: Vec<SeatId> = booking
                .seats
                .iter()
                .filter(|seat| claimed.contains(seat))
                .copied()
                .collect();
            if !taken.is_empty() {
                return Err(CommitError::Conflict { seats: taken });
            }
        }

        state
            .claimed
            .entry(booking.session.clone())
            .or_default()
            .extend(booking.seats.iter().copied());
        state.bookings.push(booking.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<BTreeSet<String>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: RwLock::new(users.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.read().await.contains(username))
    }

    async fn register(&self, username: &str) -> Result<(), UserError> {
        if self.users.write().await.insert(username.to_string()) {
            Ok(())
        } else {
            Err(UserError::AlreadyExists(username.to_string()))
        }
    }
}

/// Catalog held in memory, optionally read from a JSON file of movie
/// records (same columns as the `movies` table).
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogStore {
    movies: Vec<Movie>,
}

impl StaticCatalogStore {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            JsonCatalogError::Format(source) => StoreError::Format {
                path: path.to_path_buf(),
                source,
            },
            JsonCatalogError::Record(e) => e,
        })
    }

    fn from_json(raw: &str) -> Result<Self, JsonCatalogError> {
        let records: Vec<MovieRecord> = serde_json::from_str(raw).map_err(JsonCatalogError::Format)?;
        let movies = records
            .into_iter()
            .map(Movie::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(JsonCatalogError::Record)?;
        Ok(Self { movies })
    }
}

enum JsonCatalogError {
    Format(serde_json::Error),
    Record(StoreError),
}

#[async_trait]
impl CatalogStore for StaticCatalogStore {
    async fn load_movies(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.movies.clone())
    }
}
