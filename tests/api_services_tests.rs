// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request/response contracts of the domain API wrappers.

use ride_booking_client::error::{AppError, GENERIC_ERROR_MESSAGE};
use ride_booking_client::models::{
    CancelReason, CreateBookingRequest, FareEstimateRequest, GatewayMessage, Location,
    PaymentMethod,
};
use ride_booking_client::services::{
    ApiClient, AuthService, BookingService, CheckoutOutcome, CoinService, PaymentService,
};
use ride_booking_client::session::{LogoutReason, Session, SessionEvent};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{bearer, test_client, test_config, OLD_ACCESS};

fn location(lat: f64, lng: f64) -> Location {
    Location {
        address: None,
        latitude: lat,
        longitude: lng,
    }
}

// ─── Auth ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_verify_otp_starts_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .and(body_json(json!({"phone": "+919800000001", "otp": "1234"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "access_token": "a-1",
                "refresh_token": "r-1",
                "user": {"_id": "u-9", "name": "Asha", "phone": "+919800000001", "role": "customer"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    let mut events = session.subscribe();
    let auth = AuthService::new(ApiClient::new(&test_config(&server), session.clone()).unwrap());

    let user = auth.verify_otp("+919800000001", "1234").await.unwrap();

    assert_eq!(user.id, "u-9");
    assert!(session.is_authenticated().await);
    assert_eq!(
        session.store().access_token().await.as_deref(),
        Some("a-1")
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::LoggedIn {
            user_id: "u-9".to_string()
        }
    );
}

#[tokio::test]
async fn test_profile_replaces_stored_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1", "name": "Asha Rao", "phone": "+919800000001",
            "role": "customer", "email": "asha@example.com"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let auth = AuthService::new(client.clone());
    auth.profile().await.unwrap();

    let stored = client.session().store().user().await.unwrap();
    assert_eq!(stored.name, "Asha Rao");
    assert_eq!(stored.email.as_deref(), Some("asha@example.com"));
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    AuthService::new(client.clone()).logout().await.unwrap();

    assert!(!client.session().is_authenticated().await);
    assert_eq!(client.session().store().refresh_token().await, None);
}

#[tokio::test]
async fn test_logout_with_expired_token_ends_session_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", bearer(OLD_ACCESS).as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut events = client.session().subscribe();
    AuthService::new(client.clone()).logout().await.unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested
        }
    );
    assert!(events.try_recv().is_err());
    assert!(!client.session().is_authenticated().await);
}

// ─── Bookings ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fare_estimate_and_create_booking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/fare-estimate"))
        .and(header("authorization", bearer(OLD_ACCESS).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_fare": 149.0, "distance_km": 6.2, "currency": "INR"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/booking/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {"_id": "b-42", "status": "searching", "total_fare": 149.0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = BookingService::new(test_client(&server).await);
    let estimate = bookings
        .fare_estimate(&FareEstimateRequest {
            pickup: location(12.97, 77.59),
            drop: location(12.93, 77.62),
            vehicle_type: "bike".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(estimate.total, 149.0);

    let booking = bookings
        .create_booking(&CreateBookingRequest {
            pickup: location(12.97, 77.59),
            drop: location(12.93, 77.62),
            vehicle_type: "bike".to_string(),
            payment_method: PaymentMethod::Cash,
            fare: Some(estimate.total),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(booking.id, "b-42");
    assert_eq!(booking.fare, Some(149.0));
}

#[tokio::test]
async fn test_my_bookings_defaults_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/my-bookings"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [{"id": "b-1", "status": "completed"}],
            "page": 1, "limit": 10, "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = BookingService::new(test_client(&server).await);
    let page = bookings.my_bookings(None, None).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_cancel_booking_sends_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/b-42/cancel"))
        .and(body_json(json!({"reason": "Wrong pickup or drop address"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = BookingService::new(test_client(&server).await);
    bookings
        .cancel_booking("b-42", &CancelReason::WrongAddress)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_message_reaches_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vehicle/types"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "Service paused"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/booking/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let bookings = BookingService::new(test_client(&server).await);

    let err = bookings.vehicle_types().await.unwrap_err();
    assert_eq!(err.user_message(), "Service paused");
    assert!(err.is_retryable());

    let err = bookings.get_booking("missing").await.unwrap_err();
    assert!(matches!(err, AppError::Api { .. }));
    assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_booking_id_stays_in_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/a%2Fb%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a/b?x", "status": "searching"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = BookingService::new(test_client(&server).await);
    let booking = bookings.get_booking("a/b?x").await.unwrap();
    assert_eq!(booking.id, "a/b?x");

    let err = bookings.get_booking("").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

// ─── Payments ────────────────────────────────────────────────────

#[tokio::test]
async fn test_checkout_success_is_verified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payment/verify"))
        .and(body_json(json!({
            "booking_id": "b-42",
            "order_id": "order_1",
            "payment_id": "pay_9",
            "signature": "sig"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verified": true, "status": "paid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payments = PaymentService::new(test_client(&server).await);
    let message = GatewayMessage::parse(
        r#"{"type":"PAYMENT_SUCCESS","data":{"razorpay_order_id":"order_1","razorpay_payment_id":"pay_9","razorpay_signature":"sig"}}"#,
    )
    .unwrap();

    match payments.complete_checkout("b-42", message).await.unwrap() {
        CheckoutOutcome::Paid(receipt) => assert_eq!(receipt.status.as_deref(), Some("paid")),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_checkout_failure_and_cancel_skip_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payment/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let payments = PaymentService::new(test_client(&server).await);

    let failed = GatewayMessage::parse(
        r#"{"type":"PAYMENT_FAILED","data":{"description":"Card declined"}}"#,
    )
    .unwrap();
    assert_eq!(
        payments.complete_checkout("b-42", failed).await.unwrap(),
        CheckoutOutcome::Failed("Card declined".to_string())
    );

    let cancelled = GatewayMessage::parse(r#"{"type":"PAYMENT_CANCELLED"}"#).unwrap();
    assert_eq!(
        payments.complete_checkout("b-42", cancelled).await.unwrap(),
        CheckoutOutcome::Cancelled
    );
}

#[tokio::test]
async fn test_create_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payment/create-order"))
        .and(body_json(json!({"booking_id": "b-42", "amount": 149.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_1", "amount": 14900.0, "key": "rzp_test_abc"
        })))
        .mount(&server)
        .await;

    let payments = PaymentService::new(test_client(&server).await);
    let order = payments.create_order("b-42", 149.0).await.unwrap();
    assert_eq!(order.order_id, "order_1");
    assert_eq!(order.currency, "INR");
}

// ─── Coins ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_coin_history_and_transfer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/coins/history"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                {"_id": 7, "type": "credit", "amount": 50.0, "description": "Referral bonus"}
            ],
            "page": 2, "limit": 10, "total": 11
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/coins/transfer"))
        .and(body_json(json!({"recipient_phone": "+919800000002", "amount": 20.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction_id": "t-1", "new_balance": 30.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coins = CoinService::new(test_client(&server).await);

    let history = coins.history(Some(2), None).await.unwrap();
    assert_eq!(history.data[0].id, "7");
    assert_eq!(history.data[0].kind, "credit");
    assert!(!history.has_more());

    let result = coins.transfer("+919800000002", 20.0, None).await.unwrap();
    assert_eq!(result.new_balance, Some(30.0));
}
