use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::SeatId;
use crate::services::ReservationError;
use crate::store::UserError;

/// JSON error body: `{ "error": code, "message": text, "seats": [...] }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    seats: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    seats: &'a [String],
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            seats: Vec::new(),
        }
    }

    fn with_seats(mut self, seats: &[SeatId]) -> Self {
        self.seats = seats.iter().map(SeatId::label).collect();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ReservationError> for ApiError {
    fn from(e: ReservationError) -> Self {
        let message = e.to_string();
        match &e {
            ReservationError::MovieNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "movie_not_found", message),
            ReservationError::InvalidSelection { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_selection", message)
            }
            ReservationError::EmptyRequest => ApiError::new(StatusCode::BAD_REQUEST, "empty_request", message),
            ReservationError::InvalidSeatLabel { labels } => {
                let mut err = ApiError::new(StatusCode::BAD_REQUEST, "invalid_seat_label", message);
                err.seats = labels.clone();
                err
            }
            ReservationError::DuplicateSeatInRequest { seats } => {
                ApiError::new(StatusCode::BAD_REQUEST, "duplicate_seat_in_request", message).with_seats(seats)
            }
            ReservationError::SeatUnavailable { seats } => {
                ApiError::new(StatusCode::CONFLICT, "seat_unavailable", message).with_seats(seats)
            }
            ReservationError::Conflict { seats } => {
                ApiError::new(StatusCode::CONFLICT, "conflict", message).with_seats(seats)
            }
            ReservationError::TotalOverflow => ApiError::new(StatusCode::BAD_REQUEST, "total_overflow", message),
            ReservationError::Store(store) => {
                tracing::error!("store failure: {}", store);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Storage is unavailable")
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        let message = e.to_string();
        match e {
            UserError::AlreadyExists(_) => ApiError::new(StatusCode::CONFLICT, "already_exists", message),
            UserError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "user_not_found", message),
            UserError::InvalidUsername(_) => ApiError::new(StatusCode::BAD_REQUEST, "invalid_username", message),
            UserError::Store(store) => {
                tracing::error!("store failure: {}", store);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Storage is unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
            seats: &self.seats,
        };
        (self.status, Json(body)).into_response()
    }
}
