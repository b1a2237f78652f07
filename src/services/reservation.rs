//! reservation.rs
//!
//! Turns a requested seat set into a confirmed booking without ever
//! allocating a seat twice for the same session.
//!
//! Flow of [`ReservationEngine::reserve`]:
//! 1.  **Resolve** the movie and the 1-based showtime selection into a
//!     [`SessionKey`] and unit price.
//! 2.  **Snapshot** the booked seats of that session from the [`Ledger`].
//! 3.  **Validate** the requested labels: every malformed label, every
//!     repeated seat and every seat already taken is reported, nothing is
//!     silently dropped.
//! 4.  **Price** the request.
//! 5.  **Confirm** through a [`Confirmer`]; a "no" (or a timeout) cancels
//!     with no side effect. No lock is held while waiting.
//! 6.  **Commit** under the per-session lock. The ledger's compare-and-append
//!     reports a [`ReservationError::Conflict`] if a seat was claimed since
//!     the snapshot; the engine re-snapshots and retries up to the
//!     configured bound before giving up. Bookings are never partial.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::config::ReservationConfig;
use crate::models::{seat::join_labels, Booking, Movie, SeatId, SeatMarker, SessionKey};
use crate::seat_grid::SeatGrid;
use crate::store::{CommitError, Ledger, StoreError};

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("movie '{0}' not found")]
    MovieNotFound(String),
    #[error("invalid showtime selection '{selection}': choose 1..={available}")]
    InvalidSelection { selection: String, available: usize },
    #[error("no seats requested")]
    EmptyRequest,
    #[error("invalid seat label(s): {}", .labels.join(", "))]
    InvalidSeatLabel { labels: Vec<String> },
    #[error("seat(s) requested more than once: {}", join_labels(.seats, ", "))]
    DuplicateSeatInRequest { seats: Vec<SeatId> },
    #[error("seat(s) already booked: {}", join_labels(.seats, ", "))]
    SeatUnavailable { seats: Vec<SeatId> },
    #[error("seat(s) claimed by a concurrent booking: {}", join_labels(.seats, ", "))]
    Conflict { seats: Vec<SeatId> },
    #[error("booking total exceeds the supported range")]
    TotalOverflow,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CatalogError> for ReservationError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::MovieNotFound(id) => ReservationError::MovieNotFound(id),
            CatalogError::InvalidSelection { selection, available, .. } => {
                ReservationError::InvalidSelection { selection, available }
            }
            CatalogError::Store(e) => ReservationError::Store(e),
            CatalogError::DuplicateMovie(id) => {
                ReservationError::Store(StoreError::Corrupt(format!("duplicate movie id '{id}'")))
            }
        }
    }
}

/// A priced, validated request that has not been committed yet.
///
/// Only the engine builds quotes, so a quote always names valid,
/// distinct seats of its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    username: String,
    #[serde(flatten)]
    session: SessionKey,
    movie_name: String,
    seats: Vec<SeatId>,
    unit_price: u32,
    total: u64,
}

impl Quote {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub fn movie_name(&self) -> &str {
        &self.movie_name
    }

    pub fn seats(&self) -> &[SeatId] {
        &self.seats
    }

    pub fn unit_price(&self) -> u32 {
        self.unit_price
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    Confirmed(Booking),
    Cancelled(Quote),
}

/// Seat map of one session at the time of the read.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    #[serde(flatten)]
    pub session: SessionKey,
    pub booked: Vec<SeatId>,
    pub grid: Vec<Vec<SeatMarker>>,
    pub capacity: usize,
}

impl Availability {
    pub fn available(&self) -> usize {
        self.capacity - self.booked.len()
    }
}

/// The yes/no step between pricing and commit.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, quote: &Quote) -> bool;
}

/// Answers every confirmation the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _quote: &Quote) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPolicy {
    pub max_conflict_retries: u32,
    pub confirm_timeout: Option<Duration>,
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            max_conflict_retries: 2,
            confirm_timeout: None,
        }
    }
}

impl From<&ReservationConfig> for ReservationPolicy {
    fn from(config: &ReservationConfig) -> Self {
        Self {
            max_conflict_retries: config.max_conflict_retries,
            confirm_timeout: config.confirm_timeout_secs.map(Duration::from_secs),
        }
    }
}

// One async mutex per session; sessions never wait on each other
#[derive(Default)]
struct SessionLocks {
    locks: Mutex<HashMap<SessionKey, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session: &SessionKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(session.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

pub struct ReservationEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<dyn Ledger>,
    grid: SeatGrid,
    policy: ReservationPolicy,
    locks: SessionLocks,
}

impl ReservationEngine {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<dyn Ledger>, grid: SeatGrid, policy: ReservationPolicy) -> Self {
        Self {
            catalog,
            ledger,
            grid,
            policy,
            locks: SessionLocks::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> SeatGrid {
        self.grid
    }

    pub fn policy(&self) -> ReservationPolicy {
        self.policy
    }

    /// Movie and showtime for a raw 1-based selection.
    pub fn resolve(&self, movie_id: &str, selection: &str) -> Result<(&Movie, SessionKey), ReservationError> {
        let movie = self.catalog.find_movie(movie_id)?;
        let showtime = self.catalog.resolve_selection(movie, selection)?;
        Ok((movie, self.catalog.session_key(movie, showtime)))
    }

    pub async fn booked_seats(&self, session: &SessionKey) -> Result<HashSet<SeatId>, ReservationError> {
        Ok(self.ledger.booked_seats(session).await?)
    }

    pub async fn bookings_for(&self, username: &str) -> Result<Vec<Booking>, ReservationError> {
        Ok(self.ledger.bookings_for(username).await?)
    }

    /// Builds the seat map from an already known booked set.
    pub fn availability_from(&self, session: SessionKey, booked: &HashSet<SeatId>) -> Availability {
        let mut booked_list: Vec<SeatId> = booked.iter().copied().filter(|s| self.grid.contains(*s)).collect();
        booked_list.sort();
        Availability {
            session,
            grid: self.grid.render(booked),
            booked: booked_list,
            capacity: self.grid.capacity(),
        }
    }

    pub async fn availability(&self, movie_id: &str, selection: &str) -> Result<Availability, ReservationError> {
        let (_, session) = self.resolve(movie_id, selection)?;
        let booked = self.ledger.booked_seats(&session).await?;
        Ok(self.availability_from(session, &booked))
    }

    /// Steps 1–4: resolve, snapshot, validate and price. No side effects.
    pub async fn quote<S: AsRef<str>>(
        &self,
        username: &str,
        movie_id: &str,
        selection: &str,
        labels: &[S],
    ) -> Result<Quote, ReservationError> {
        let (movie, session) = self.resolve(movie_id, selection)?;
        let booked = self.ledger.booked_seats(&session).await?;
        let seats = self.validate(labels, &booked)?;

        let unit_price = self.catalog.price(movie);
        let total = u64::try_from(seats.len())
            .ok()
            .and_then(|count| count.checked_mul(u64::from(unit_price)))
            .ok_or(ReservationError::TotalOverflow)?;

        debug!("Quoted {} seat(s) for {} on {}: total {}", seats.len(), username, session, total);
        Ok(Quote {
            username: username.to_string(),
            session,
            movie_name: movie.name.clone(),
            seats,
            unit_price,
            total,
        })
    }

    /// Step 6: commit a quote, retrying from the snapshot on conflict.
    pub async fn commit(&self, quote: Quote) -> Result<Booking, ReservationError> {
        let _guard = self.locks.acquire(&quote.session).await;
        let booking = Booking::new(
            quote.username.as_str(),
            quote.session.clone(),
            quote.movie_name.as_str(),
            quote.seats.clone(),
            quote.total,
        );

        let mut retries = 0;
        loop {
            match self.ledger.commit(&booking).await {
                Ok(()) => {
                    info!(
                        "Booking {} confirmed: {} took {} on {} for {}",
                        booking.id,
                        booking.username,
                        join_labels(&booking.seats, ","),
                        booking.session,
                        booking.total
                    );
                    return Ok(booking);
                }
                Err(CommitError::Conflict { seats }) => {
                    warn!(
                        "Commit conflict on {} for {}: {} already claimed (retry {}/{})",
                        booking.session,
                        booking.username,
                        join_labels(&seats, ","),
                        retries,
                        self.policy.max_conflict_retries
                    );
                    if retries >= self.policy.max_conflict_retries {
                        return Err(ReservationError::Conflict { seats });
                    }
                    retries += 1;

                    let booked = self.ledger.booked_seats(&booking.session).await?;
                    let lost: Vec<SeatId> = booking.seats.iter().copied().filter(|s| booked.contains(s)).collect();
                    if !lost.is_empty() {
                        return Err(ReservationError::SeatUnavailable { seats: lost });
                    }
                }
                Err(CommitError::Store(e)) => return Err(e.into()),
            }
        }
    }

    /// Full reservation: quote, confirm, commit.
    pub async fn reserve<S, C>(
        &self,
        username: &str,
        movie_id: &str,
        selection: &str,
        labels: &[S],
        confirmer: &C,
    ) -> Result<Reservation, ReservationError>
    where
        S: AsRef<str>,
        C: Confirmer + ?Sized,
    {
        let quote = self.quote(username, movie_id, selection, labels).await?;

        if !self.confirm(&quote, confirmer).await {
            info!("Booking for {} on {} cancelled at confirmation", quote.username, quote.session);
            return Ok(Reservation::Cancelled(quote));
        }

        self.commit(quote).await.map(Reservation::Confirmed)
    }

    async fn confirm<C: Confirmer + ?Sized>(&self, quote: &Quote, confirmer: &C) -> bool {
        match self.policy.confirm_timeout {
            Some(limit) => match tokio::time::timeout(limit, confirmer.confirm(quote)).await {
                Ok(answer) => answer,
                Err(_) => {
                    warn!("Confirmation for {} on {} timed out after {:?}", quote.username, quote.session, limit);
                    false
                }
            },
            None => confirmer.confirm(quote).await,
        }
    }

    fn validate<S: AsRef<str>>(&self, labels: &[S], booked: &HashSet<SeatId>) -> Result<Vec<SeatId>, ReservationError> {
        let labels: Vec<&str> = labels
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(ReservationError::EmptyRequest);
        }

        let mut seats = Vec::with_capacity(labels.len());
        let mut invalid = Vec::new();
        for label in labels {
            match self.grid.parse(label) {
                Ok(seat) => seats.push(seat),
                Err(_) => invalid.push(label.to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(ReservationError::InvalidSeatLabel { labels: invalid });
        }

        let mut seen = HashSet::with_capacity(seats.len());
        let mut duplicates = Vec::new();
        for seat in &seats {
            if !seen.insert(*seat) && !duplicates.contains(seat) {
                duplicates.push(*seat);
            }
        }
        if !duplicates.is_empty() {
            return Err(ReservationError::DuplicateSeatInRequest { seats: duplicates });
        }

        let unavailable: Vec<SeatId> = seats.iter().copied().filter(|s| booked.contains(s)).collect();
        if !unavailable.is_empty() {
            return Err(ReservationError::SeatUnavailable { seats: unavailable });
        }

        Ok(seats)
    }
}
