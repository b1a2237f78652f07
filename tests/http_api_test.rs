//! HTTP contract of the booking API, exercised in-process with `oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tower::ServiceExt;

use showtime_booking::controllers;

fn app() -> Router {
    controllers::app(common::app_state())
}

fn basic(username: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(format!("{username}:")))
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

#[tokio::test]
async fn health_and_banner() {
    let app = app();
    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn movies_are_grouped_by_genre_in_catalog_order() {
    let app = app();
    let (status, body) = send(&app, get("/api/movies", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let genres: Vec<&str> = body["genres"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["genre"].as_str().unwrap())
        .collect();
    assert_eq!(genres, vec!["Sci-Fi", "Action"]);
    assert_eq!(body["genres"][0]["movies"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get("/api/movies/M1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["showtimes"][1], json!({ "selection": 2, "showtime": "7:00 PM" }));

    let (status, body) = send(&app, get("/api/movies/NOPE", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "movie_not_found");
}

#[tokio::test]
async fn booking_requires_a_known_user() {
    let app = app();
    let booking = json!({ "movie_id": "M1", "showtime": 1, "seats": ["A1"], "confirm": true });

    let (status, _) = send(&app, post("/api/bookings", None, booking.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, post("/api/bookings", Some("mallory"), booking)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_then_book() {
    let app = app();

    let (status, body) = send(&app, post("/api/users", None, json!({ "username": " carol " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "carol");

    let (status, body) = send(&app, post("/api/users", None, json!({ "username": "carol" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    let (status, body) = send(
        &app,
        post(
            "/api/bookings",
            Some("carol"),
            json!({ "movie_id": "M1", "showtime": "1", "seats": ["b2", "B3"], "confirm": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["seats"], json!(["B2", "B3"]));
    assert_eq!(body["total"], 500);
    assert_eq!(body["showtime"], "10:00 AM");

    let (status, body) = send(&app, get("/api/bookings", Some("carol"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn taken_seats_conflict_and_seat_map_reflects_them() {
    let app = app();
    let request = |seats: Value| json!({ "movie_id": "M2", "showtime": 1, "seats": seats, "confirm": true });

    let (status, _) = send(&app, post("/api/bookings", Some("alice"), request(json!(["A1", "A2"])))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, post("/api/bookings", Some("bob"), request(json!(["A2", "A3"])))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat_unavailable");
    assert_eq!(body["seats"], json!(["A2"]));

    let (status, body) = send(&app, get("/api/movies/M2/showtimes/1/seats", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"][0], "XXOOOOOOOO");
    assert_eq!(body["booked"], json!(["A1", "A2"]));
    assert_eq!(body["available"], 48);
}

#[tokio::test]
async fn quotes_and_declined_bookings_store_nothing() {
    let app = app();

    let (status, body) = send(
        &app,
        post("/api/bookings/quote", Some("alice"), json!({ "movie_id": "M3", "showtime": 1, "seats": ["C1", "C2", "C3"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 600);

    let (status, body) = send(
        &app,
        post("/api/bookings", Some("alice"), json!({ "movie_id": "M3", "showtime": 1, "seats": ["C1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (_, body) = send(&app, get("/api/bookings", Some("alice"))).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_requests_name_the_problem() {
    let app = app();

    let (status, body) = send(
        &app,
        post("/api/bookings", Some("bob"), json!({ "movie_id": "M1", "showtime": 1, "seats": ["Z9", "A11"], "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_seat_label");
    assert_eq!(body["seats"], json!(["Z9", "A11"]));

    let (status, body) = send(
        &app,
        post("/api/bookings", Some("bob"), json!({ "movie_id": "M1", "showtime": 99, "seats": ["A1"], "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_selection");

    let (status, body) = send(
        &app,
        post("/api/bookings", Some("bob"), json!({ "movie_id": "M1", "showtime": 1, "seats": [], "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_request");
}
