// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend API wrappers and booking tracking.

pub mod api_client;
pub mod auth;
pub mod booking;
pub mod coins;
pub mod geocoding;
pub mod payment;
pub mod tracking;

pub use api_client::{ApiClient, ApiRequest};
pub use auth::AuthService;
pub use booking::BookingService;
pub use coins::CoinService;
pub use geocoding::GeocodingService;
pub use payment::{CheckoutOutcome, PaymentService};
pub use tracking::{BookingStatus, BookingTracker, TrackerHandle, TrackingState};
