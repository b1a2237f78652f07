use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, info};

use super::{CatalogStore, CommitError, Ledger, StoreError, UserDirectory, UserError};
use crate::models::{Booking, BookingRecord, Movie, MovieRecord, SeatId, SessionKey};
use crate::seat_grid::SeatGrid;

/// Ledger over the `bookings` / `booking_seats` tables.
///
/// `booking_seats` has a primary key on (movie_id, showtime, seat), so the
/// database itself refuses a second claim on a seat, across processes.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
    grid: SeatGrid,
}

impl PgLedger {
    pub fn new(pool: PgPool, grid: SeatGrid) -> Self {
        Self { pool, grid }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn booked_seats(&self, session: &SessionKey) -> Result<HashSet<SeatId>, StoreError> {
        let labels: Vec<String> = sqlx::query_scalar(
            "SELECT seat FROM booking_seats WHERE movie_id = $1 AND showtime = $2"
        )
        .bind(&session.movie_id)
        .bind(&session.showtime)
        .fetch_all(&self.pool)
        .await?;

        labels
            .iter()
            .map(|label| {
                self.grid
                    .parse(label)
                    .map_err(|e| StoreError::Corrupt(format!("session {}: {}", session, e)))
            })
            .collect()
    }

    async fn bookings_for(&self, username: &str) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRecord>(
            r#"
            SELECT id, username, movie_id, movie_name, showtime, seats, total, created_at
            FROM bookings
            WHERE username = $1
            ORDER BY seq
            "#
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_booking(&self.grid)).collect()
    }

    async fn commit(&self, booking: &Booking) -> Result<(), CommitError> {
        let total = i64::try_from(booking.total)
            .map_err(|_| StoreError::Corrupt(format!("booking total {} out of range", booking.total)))?;

        let mut tx = self.pool.begin().await?;

        // Commits on one session queue here, across processes, until the
        // holder's transaction ends.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || '|' || $2))")
            .bind(&booking.session.movie_id)
            .bind(&booking.session.showtime)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO bookings (id, username, movie_id, movie_name, showtime, seats, total, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        )
        .bind(booking.id)
        .bind(&booking.username)
        .bind(&booking.session.movie_id)
        .bind(&booking.movie_name)
        .bind(&booking.session.showtime)
        .bind(booking.seat_labels())
        .bind(total)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await?;

        // Claims go in seat order so overlapping transactions lock rows in
        // the same sequence.
        let mut claims = booking.seats.clone();
        claims.sort();

        let mut taken = Vec::new();
        for seat in &claims {
            let inserted = sqlx::query(
                "INSERT INTO booking_seats (booking_id, movie_id, showtime, seat)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (movie_id, showtime, seat) DO NOTHING"
            )
            .bind(booking.id)
            .bind(&booking.session.movie_id)
            .bind(&booking.session.showtime)
            .bind(seat.label())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                taken.push(*seat);
            }
        }

        if !taken.is_empty() {
            tx.rollback().await?;
            debug!("commit of booking {} rolled back, {} seat(s) taken", booking.id, taken.len());
            return Err(CommitError::Conflict { seats: taken });
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)"
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn register(&self, username: &str) -> Result<(), UserError> {
        let inserted = sqlx::query(
            "INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING"
        )
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if inserted == 0 {
            return Err(UserError::AlreadyExists(username.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts movies, e.g. from a hand-edited catalog file.
    pub async fn import(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for movie in movies {
            let record = MovieRecord::from(movie);
            sqlx::query(
                r#"
                INSERT INTO movies (movie_id, movie_name, genre, screen, showtimes, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (movie_id) DO UPDATE
                SET movie_name = EXCLUDED.movie_name,
                    genre = EXCLUDED.genre,
                    screen = EXCLUDED.screen,
                    showtimes = EXCLUDED.showtimes,
                    price = EXCLUDED.price
                "#
            )
            .bind(&record.movie_id)
            .bind(&record.movie_name)
            .bind(&record.genre)
            .bind(&record.screen)
            .bind(&record.showtimes)
            .bind(record.price)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Imported {} movies into catalog", movies.len());
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn load_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query_as::<_, MovieRecord>(
            "SELECT movie_id, movie_name, genre, screen, showtimes, price FROM movies ORDER BY movie_id"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Movie::try_from).collect()
    }
}
