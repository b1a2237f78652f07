use axum::{
    extract::{Path, State},
    http::{header::HeaderName, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::cache::Lookup;
use crate::catalog::GenreGroup;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{movie_id}", get(get_movie))
        .route("/movies/{movie_id}/showtimes/{selection}/seats", get(get_seats))
}

// GET /api/movies
#[derive(Debug, Serialize)]
struct MoviesResponse<'a> {
    genres: Vec<GenreGroup<'a>>,
    count: usize,
}

async fn list_movies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let genres = state.catalog.list_movies();
    let response = MoviesResponse {
        count: state.catalog.movies().len(),
        genres,
    };
    Json(serde_json::to_value(response).unwrap_or_default())
}

// GET /api/movies/{movie_id}
#[derive(Debug, Serialize)]
struct ShowtimeOption {
    selection: usize,
    showtime: String,
}

#[derive(Debug, Serialize)]
struct MovieResponse {
    movie_id: String,
    name: String,
    genre: String,
    screen: String,
    price: u32,
    showtimes: Vec<ShowtimeOption>,
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
) -> Result<Json<MovieResponse>, ApiError> {
    let movie = state
        .catalog
        .find_movie(&movie_id)
        .map_err(crate::services::ReservationError::from)?;

    Ok(Json(MovieResponse {
        movie_id: movie.movie_id.clone(),
        name: movie.name.clone(),
        genre: movie.genre.clone(),
        screen: movie.screen.clone(),
        price: state.catalog.price(movie),
        showtimes: movie
            .showtimes
            .iter()
            .enumerate()
            .map(|(i, s)| ShowtimeOption { selection: i + 1, showtime: s.clone() })
            .collect(),
    }))
}

// GET /api/movies/{movie_id}/showtimes/{selection}/seats
#[derive(Debug, Serialize)]
struct SeatMapResponse {
    movie_id: String,
    showtime: String,
    rows: Vec<String>,
    booked: Vec<String>,
    capacity: usize,
    available: usize,
}

async fn get_seats(
    State(state): State<Arc<AppState>>,
    Path((movie_id, selection)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, session) = state.engine.resolve(&movie_id, &selection)?;
    let grid = state.engine.grid();

    // Cache first, ledger on miss
    let lookup = match &state.cache {
        Some(cache) => Some(cache.lookup(&session, &grid).await),
        None => None,
    };
    let (booked, cache_status) = match lookup {
        Some(Lookup::Hit(booked)) => (booked, "HIT"),
        Some(Lookup::Miss(generation)) => {
            let booked = state.engine.booked_seats(&session).await?;
            if let Some(cache) = &state.cache {
                cache.save_booked(&session, &booked, generation).await;
            }
            (booked, "MISS")
        }
        None => (state.engine.booked_seats(&session).await?, "MISS"),
    };

    let availability = state.engine.availability_from(session, &booked);
    let response = SeatMapResponse {
        rows: availability
            .grid
            .iter()
            .map(|row| row.iter().map(|m| m.as_char()).collect())
            .collect(),
        booked: availability.booked.iter().map(|s| s.label()).collect(),
        capacity: availability.capacity,
        available: availability.available(),
        movie_id: availability.session.movie_id,
        showtime: availability.session.showtime,
    };

    Ok((
        [(HeaderName::from_static("x-cache"), HeaderValue::from_static(cache_status))],
        Json(response),
    ))
}
