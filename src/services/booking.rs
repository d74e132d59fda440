// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vehicle and booking endpoints.

use crate::error::AppError;
use crate::models::{
    Booking, CancelBookingRequest, CancelReason, CreateBookingRequest, FareEstimate,
    FareEstimateRequest, Page, VehicleType,
};
use crate::services::api_client::{ApiClient, ApiRequest};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Booking API.
#[derive(Clone)]
pub struct BookingService {
    api: ApiClient,
}

impl BookingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn vehicle_types(&self) -> Result<Vec<VehicleType>, AppError> {
        self.api.get("/vehicle/types").await
    }

    pub async fn fare_estimate(
        &self,
        request: &FareEstimateRequest,
    ) -> Result<FareEstimate, AppError> {
        self.api.post("/booking/fare-estimate", request).await
    }

    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, AppError> {
        let booking: Booking = self.api.post("/booking/create", request).await?;
        tracing::info!(booking_id = %booking.id, status = %booking.status, "Booking created");
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.api.get(&booking_path(booking_id, "")?).await
    }

    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &CancelReason,
    ) -> Result<(), AppError> {
        let body = CancelBookingRequest {
            reason: reason.to_string(),
        };
        let _: serde_json::Value = self
            .api
            .post(&booking_path(booking_id, "/cancel")?, &body)
            .await?;
        tracing::info!(booking_id, reason = %reason, "Booking cancelled");
        Ok(())
    }

    /// The caller's bookings, newest first. Pagination defaults to page 1 of 10.
    pub async fn my_bookings(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<Booking>, AppError> {
        let request = ApiRequest::get("/booking/my-bookings")
            .query("page", page.unwrap_or(DEFAULT_PAGE))
            .query("limit", limit.unwrap_or(DEFAULT_PAGE_SIZE));
        self.api.send(request).await
    }
}

/// `/booking/{id}{suffix}` with the id escaped as a single path segment.
fn booking_path(booking_id: &str, suffix: &str) -> Result<String, AppError> {
    if booking_id.trim().is_empty() {
        return Err(AppError::BadRequest("Booking id is required".to_string()));
    }
    Ok(format!(
        "/booking/{}{}",
        urlencoding::encode(booking_id),
        suffix
    ))
}
