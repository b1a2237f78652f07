//! End-to-end reservation flows against the in-memory ledger.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

mod common;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use showtime_booking::{
    models::{Booking, SeatId},
    services::{AutoConfirm, Confirmer, Quote, Reservation, ReservationError, ReservationPolicy},
    store::{Ledger, MemoryLedger},
};

fn seat(label: &str) -> SeatId {
    showtime_booking::seat_grid::SeatGrid::default().parse(label).unwrap()
}

#[tokio::test]
async fn second_customer_cannot_take_a_booked_seat() {
    let engine = common::engine();

    let first = engine
        .reserve("alice", "M1", "1", &["A1", "A2"], &AutoConfirm(true))
        .await
        .unwrap();
    let Reservation::Confirmed(booking) = first else {
        panic!("expected a confirmed booking");
    };
    assert_eq!(booking.seats, vec![seat("A1"), seat("A2")]);
    assert_eq!(booking.total, 500);
    assert_eq!(booking.session.showtime, "10:00 AM");

    let err = engine
        .reserve("bob", "M1", "1", &["A2", "A3"], &AutoConfirm(true))
        .await
        .unwrap_err();
    match err {
        ReservationError::SeatUnavailable { seats } => assert_eq!(seats, vec![seat("A2")]),
        other => panic!("unexpected error: {other}"),
    }

    // Same seats at the other showtime are a separate inventory
    let evening = engine
        .reserve("bob", "M1", "2", &["A2", "A3"], &AutoConfirm(true))
        .await
        .unwrap();
    assert!(matches!(evening, Reservation::Confirmed(_)));

    assert_eq!(engine.bookings_for("alice").await.unwrap().len(), 1);
    assert_eq!(engine.bookings_for("bob").await.unwrap().len(), 1);

    let availability = engine.availability("M1", "1").await.unwrap();
    assert_eq!(availability.booked, vec![seat("A1"), seat("A2")]);
    assert_eq!(availability.available(), 48);
}

#[tokio::test]
async fn bad_input_is_rejected_before_anything_is_stored() {
    let engine = common::engine();

    let err = engine.quote("alice", "M1", "1", &["A1", "Z9", "A0"]).await.unwrap_err();
    match err {
        ReservationError::InvalidSeatLabel { labels } => assert_eq!(labels, vec!["Z9", "A0"]),
        other => panic!("unexpected error: {other}"),
    }

    let err = engine.quote("alice", "M1", "99", &["A1"]).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidSelection { available: 2, .. }));

    let err = engine.quote("alice", "M1", "one", &["A1"]).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidSelection { .. }));

    let err = engine.quote("alice", "NOPE", "1", &["A1"]).await.unwrap_err();
    assert!(matches!(err, ReservationError::MovieNotFound(id) if id == "NOPE"));

    let err = engine.quote("alice", "M1", "1", &[" ", ""]).await.unwrap_err();
    assert!(matches!(err, ReservationError::EmptyRequest));

    let err = engine.quote("alice", "M1", "1", &["a1", "A1"]).await.unwrap_err();
    match err {
        ReservationError::DuplicateSeatInRequest { seats } => assert_eq!(seats, vec![seat("A1")]),
        other => panic!("unexpected error: {other}"),
    }

    assert!(engine.bookings_for("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_confirmation_leaves_seats_free() {
    let engine = common::engine();

    let outcome = engine
        .reserve("alice", "M2", "1", &["C3", "C4"], &AutoConfirm(false))
        .await
        .unwrap();
    let Reservation::Cancelled(quote) = outcome else {
        panic!("expected a cancelled reservation");
    };
    assert_eq!(quote.total(), 440);
    assert_eq!(quote.unit_price(), 220);

    assert!(engine.availability("M2", "1").await.unwrap().booked.is_empty());
    assert!(engine.bookings_for("alice").await.unwrap().is_empty());
}

struct SlowConfirm;

#[async_trait]
impl Confirmer for SlowConfirm {
    async fn confirm(&self, _quote: &Quote) -> bool {
        tokio::time::sleep(Duration::from_secs(60)).await;
        true
    }
}

#[tokio::test(start_paused = true)]
async fn confirmation_timeout_cancels() {
    let policy = ReservationPolicy {
        confirm_timeout: Some(Duration::from_secs(5)),
        ..ReservationPolicy::default()
    };
    let engine = common::engine_with(Arc::new(MemoryLedger::new()), policy);

    let outcome = engine.reserve("alice", "M1", "1", &["B1"], &SlowConfirm).await.unwrap();
    assert!(matches!(outcome, Reservation::Cancelled(_)));
    assert!(engine.bookings_for("alice").await.unwrap().is_empty());
}

/// Books the quoted first seat behind the engine's back while "thinking".
struct Interloper {
    ledger: Arc<MemoryLedger>,
}

#[async_trait]
impl Confirmer for Interloper {
    async fn confirm(&self, quote: &Quote) -> bool {
        let stolen = Booking::new(
            "mallory",
            quote.session().clone(),
            quote.movie_name(),
            vec![quote.seats()[0]],
            u64::from(quote.unit_price()),
        );
        self.ledger.commit(&stolen).await.unwrap();
        true
    }
}

#[tokio::test]
async fn lost_race_reports_the_taken_seat() {
    let ledger = Arc::new(MemoryLedger::new());
    let engine = common::engine_with(ledger.clone(), ReservationPolicy::default());

    let err = engine
        .reserve("alice", "M1", "1", &["D5", "D6"], &Interloper { ledger: ledger.clone() })
        .await
        .unwrap_err();
    match err {
        ReservationError::SeatUnavailable { seats } => assert_eq!(seats, vec![seat("D5")]),
        other => panic!("unexpected error: {other}"),
    }

    // Only the interloper's booking exists; D6 stayed free
    assert_eq!(ledger.len().await, 1);
    let booked = engine.availability("M1", "1").await.unwrap().booked;
    assert_eq!(booked, vec![seat("D5")]);
}

#[tokio::test]
async fn conflict_without_retries_is_surfaced() {
    let ledger = Arc::new(MemoryLedger::new());
    let policy = ReservationPolicy {
        max_conflict_retries: 0,
        ..ReservationPolicy::default()
    };
    let engine = common::engine_with(ledger.clone(), policy);

    let err = engine
        .reserve("alice", "M1", "1", &["E1"], &Interloper { ledger: ledger.clone() })
        .await
        .unwrap_err();
    match err {
        ReservationError::Conflict { seats } => assert_eq!(seats, vec![seat("E1")]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.bookings_for("alice").await.unwrap().is_empty());
}
