// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking tracking against a mock backend.

use ride_booking_client::models::CancelReason;
use ride_booking_client::services::tracking::Transition;
use ride_booking_client::services::{BookingService, BookingStatus, BookingTracker};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::test_client;

async fn tracker_for(server: &MockServer, interval: Duration) -> Arc<BookingTracker<BookingService>> {
    let bookings = Arc::new(BookingService::new(test_client(server).await));
    Arc::new(BookingTracker::new(bookings, "b-42", interval))
}

#[tokio::test]
async fn test_tracker_follows_booking_to_completion() {
    let server = MockServer::start().await;
    let snapshots = [
        json!({"id": "b-42", "status": "searching"}),
        json!({"id": "b-42", "status": "driver_assigned",
               "driver": {"name": "Kiran", "vehicle_number": "KA01AB1234"}, "otp": "4821"}),
        json!({"id": "b-42", "status": "picked_up", "driver": {"name": "Kiran"}}),
        json!({"id": "b-42", "status": "completed", "driver": {"name": "Kiran"}}),
    ];
    for snapshot in snapshots {
        Mock::given(method("GET"))
            .and(path("/api/booking/b-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let tracker = tracker_for(&server, Duration::from_millis(30)).await;
    let mut updates = tracker.subscribe();
    let mut handle = tracker.spawn();

    let mut seen = Vec::new();
    let mut otp_seen = None;
    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        if seen.last() != Some(&state.status) {
            seen.push(state.status);
        }
        if state.otp.is_some() {
            otp_seen = state.otp.clone();
        }
        if state.status.is_terminal() {
            break;
        }
    }

    let final_state = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("tracker should stop after completion");

    assert_eq!(final_state.status, BookingStatus::Completed);
    assert_eq!(seen.last(), Some(&BookingStatus::Completed));
    assert!(seen.contains(&BookingStatus::InProgress));
    assert_eq!(otp_seen.as_deref(), Some("4821"));

    // No polling after the terminal state.
    let polls = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), polls);
}

#[tokio::test]
async fn test_poll_error_keeps_last_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/b-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "b-42", "status": "arriving"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/booking/b-42"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_secs(5)).await;
    tracker.poll_once().await.unwrap();
    assert!(tracker.poll_once().await.is_err());

    let state = tracker.state();
    assert_eq!(state.status, BookingStatus::Arriving);
    assert!(state.last_error.is_some());
    assert_eq!(state.polls, 1);
}

#[tokio::test]
async fn test_cancel_overrides_next_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/b-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": "b-42", "status": "arriving", "driver_id": "d-1"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/booking/b-42/cancel"))
        .and(body_json(json!({"reason": "Going by metro"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_secs(5)).await;
    tracker.poll_once().await.unwrap();

    tracker
        .cancel(&CancelReason::Other("Going by metro".to_string()))
        .await
        .unwrap();
    assert_eq!(tracker.state().status, BookingStatus::Cancelled);

    assert_eq!(
        tracker.poll_once().await.unwrap(),
        Transition::Ignored(BookingStatus::Cancelled)
    );
    assert_eq!(tracker.state().status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_unknown_status_is_flagged_not_hidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/b-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": "b-42", "status": "unknown_future_status"}),
        ))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_secs(5)).await;
    tracker.poll_once().await.unwrap();

    let state = tracker.state();
    assert_eq!(state.status, BookingStatus::Searching);
    assert_eq!(
        state.unrecognized_status.as_deref(),
        Some("unknown_future_status")
    );
}
