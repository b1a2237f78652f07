use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::Booking;
use crate::services::{AutoConfirm, Quote, Reservation};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings))
        .route("/bookings", post(create_booking))
        .route("/bookings/quote", post(quote_booking))
}

/// Showtime number as sent by clients: `1` or `"1"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ShowtimeSelection {
    Number(u64),
    Text(String),
}

impl ShowtimeSelection {
    fn as_input(&self) -> String {
        match self {
            ShowtimeSelection::Number(n) => n.to_string(),
            ShowtimeSelection::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub movie_id: String,
    pub showtime: ShowtimeSelection,
    pub seats: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub movie_id: String,
    pub showtime: ShowtimeSelection,
    pub seats: Vec<String>,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
struct CancelledResponse {
    status: &'static str,
    quote: Quote,
}

// POST /api/bookings/quote
async fn quote_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    let quote = state
        .engine
        .quote(&user.username, &req.movie_id, &req.showtime.as_input(), req.seats.as_slice())
        .await?;
    Ok(Json(quote))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Response, ApiError> {
    let reservation = state
        .engine
        .reserve(
            &user.username,
            &req.movie_id,
            &req.showtime.as_input(),
            req.seats.as_slice(),
            &AutoConfirm(req.confirm),
        )
        .await?;

    match reservation {
        Reservation::Confirmed(booking) => {
            if let Some(cache) = &state.cache {
                cache.invalidate(&booking.session).await;
            }
            Ok((StatusCode::CREATED, Json(booking)).into_response())
        }
        Reservation::Cancelled(quote) => Ok((
            StatusCode::OK,
            Json(CancelledResponse { status: "cancelled", quote }),
        )
            .into_response()),
    }
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let bookings = state.engine.bookings_for(&user.username).await?;
    Ok(Json(bookings))
}
