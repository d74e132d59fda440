// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ride-booking client: the portable core of an on-demand delivery and
//! ride booking app.
//!
//! This crate provides the credential store, the authenticated backend
//! client with single-flight token refresh, typed API wrappers, and live
//! booking tracking.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

use config::Config;
use error::AppError;
use services::{
    ApiClient, AuthService, BookingService, CoinService, GeocodingService, PaymentService,
};
use session::Session;
use std::sync::Arc;

/// Everything a front end needs, wired around one session.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Session,
    pub auth: AuthService,
    pub bookings: Arc<BookingService>,
    pub payments: PaymentService,
    pub coins: CoinService,
    pub geocoding: GeocodingService,
}

impl AppState {
    /// Build all services around `session`.
    pub fn new(config: Config, session: Session) -> Result<Self, AppError> {
        let api = ApiClient::new(&config, session.clone())?;
        let geocoding = GeocodingService::new(&config)?;

        Ok(Self {
            auth: AuthService::new(api.clone()),
            bookings: Arc::new(BookingService::new(api.clone())),
            payments: PaymentService::new(api.clone()),
            coins: CoinService::new(api),
            geocoding,
            session,
            config,
        })
    }

    /// Open the persisted session named in `config` and build all services.
    pub async fn open(config: Config) -> Result<Self, AppError> {
        let session = Session::open(&config.credentials_path).await?;
        Self::new(config, session)
    }
}
