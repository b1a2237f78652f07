pub mod bookings;
pub mod error;
pub mod movies;
pub mod users;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(bookings::routes())
        .merge(users::routes())
}

/// Full HTTP application: banner, health check and the `/api` routes.
pub fn app(state: Arc<crate::AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Showtime Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
