//! Redis cache for rendered seat maps.
//!
//! Only the availability endpoint reads it. Reservation decisions always
//! go to the ledger.
//!
//! Each session has a generation counter next to its entry. A confirmed
//! booking bumps the counter, and an entry only counts as a hit while its
//! recorded generation is still current. A reader that loaded the ledger
//! before a commit can still write its snapshot afterwards, but that write
//! carries the old generation and is ignored.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::models::{SeatId, SessionKey};
use crate::seat_grid::SeatGrid;

#[derive(Clone)]
pub struct CacheService {
    conn: MultiplexedConnection,
    ttl_seconds: u64,
}

/// Generation observed on a miss. `None` means the counter could not be
/// read, and the snapshot must not be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(Option<u64>);

#[derive(Debug)]
pub enum Lookup {
    Hit(HashSet<SeatId>),
    Miss(Generation),
}

impl CacheService {
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Seat map cache connected (ttl {}s)", ttl_seconds);
        Ok(Self { conn, ttl_seconds })
    }

    pub fn key(session: &SessionKey) -> String {
        format!("seats:{}:{}", session.movie_id, session.showtime)
    }

    pub fn generation_key(session: &SessionKey) -> String {
        format!("seats-gen:{}:{}", session.movie_id, session.showtime)
    }

    /// Cached booked set when current. A Redis failure, a stale generation
    /// or an entry that no longer fits the hall is a miss.
    pub async fn lookup(&self, session: &SessionKey, grid: &SeatGrid) -> Lookup {
        let mut conn = self.conn.clone();
        let keys = [Self::generation_key(session), Self::key(session)];
        let values: Vec<Option<String>> = match conn.mget(&keys[..]).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Seat cache read failed for {}: {}", session, e);
                return Lookup::Miss(Generation(None));
            }
        };

        let mut values = values.into_iter();
        let current = match values.next().flatten() {
            None => 0,
            Some(raw) => match raw.parse::<u64>() {
                Ok(generation) => generation,
                Err(_) => return Lookup::Miss(Generation(None)),
            },
        };
        match values.next().flatten().and_then(|data| decode_booked(&data, grid, current)) {
            Some(booked) => Lookup::Hit(booked),
            None => Lookup::Miss(Generation(Some(current))),
        }
    }

    pub async fn save_booked(&self, session: &SessionKey, booked: &HashSet<SeatId>, generation: Generation) {
        let Generation(Some(generation)) = generation else {
            return;
        };
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = conn
            .set_ex(Self::key(session), encode_booked(booked, generation), self.ttl_seconds)
            .await;
        if let Err(e) = result {
            warn!("Seat cache write failed for {}: {}", session, e);
        }
    }

    /// Retires every entry written for `session` so far.
    pub async fn invalidate(&self, session: &SessionKey) {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<u64> = conn.incr(Self::generation_key(session), 1).await;
        match result {
            Ok(generation) => debug!("Seat cache for {} now at generation {}", session, generation),
            Err(e) => warn!("Seat cache invalidation failed for {}: {}", session, e),
        }
    }
}

#[derive(Serialize)]
struct CachedSeats<'a> {
    generation: u64,
    seats: &'a [SeatId],
}

#[derive(Deserialize)]
struct CachedEntry {
    generation: u64,
    seats: Vec<String>,
}

// Labels sorted, tagged with the generation they were read under
fn encode_booked(booked: &HashSet<SeatId>, generation: u64) -> String {
    let mut seats: Vec<SeatId> = booked.iter().copied().collect();
    seats.sort();
    serde_json::to_string(&CachedSeats { generation, seats: &seats })
        .unwrap_or_else(|_| "{}".to_string())
}

fn decode_booked(data: &str, grid: &SeatGrid, current: u64) -> Option<HashSet<SeatId>> {
    let entry: CachedEntry = serde_json::from_str(data).ok()?;
    if entry.generation != current {
        return None;
    }
    entry.seats.iter().map(|l| grid.parse(l).ok()).collect()
}
