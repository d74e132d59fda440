// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live booking tracking.
//!
//! Polls a booking on a fixed interval and projects the server's status
//! string onto a small set of client states. Once the booking reaches
//! `Completed` or `Cancelled` polling stops and the state is frozen.

use crate::error::AppError;
use crate::models::{Booking, CancelReason, Driver};
use crate::services::BookingService;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Client-side projection of the server's booking status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Searching,
    Assigned,
    Arriving,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Searching => "searching",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Arriving => "arriving",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw server status, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStatus {
    /// Maps to a state on its own.
    Known(BookingStatus),
    /// A known pre-pickup status; the state depends on whether a driver is attached.
    AwaitingDriver,
    /// Not a status this client knows about.
    Unrecognized(String),
}

/// Classify a raw server status string (case-insensitive).
pub fn parse_status(raw: &str) -> ParsedStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cancelled" | "canceled" => ParsedStatus::Known(BookingStatus::Cancelled),
        "completed" => ParsedStatus::Known(BookingStatus::Completed),
        "in_progress" | "picked_up" => ParsedStatus::Known(BookingStatus::InProgress),
        "driver_arriving" | "arriving" => ParsedStatus::Known(BookingStatus::Arriving),
        "assigned" | "driver_assigned" => ParsedStatus::Known(BookingStatus::Assigned),
        "" | "pending" | "searching" | "requested" | "created" | "confirmed" | "accepted" => {
            ParsedStatus::AwaitingDriver
        }
        _ => ParsedStatus::Unrecognized(raw.trim().to_string()),
    }
}

/// Project a booking snapshot onto a client state.
///
/// Statuses without a fixed mapping become `Assigned` when a driver is
/// attached and `Searching` otherwise. The second value is the raw status
/// when it was not recognized.
pub fn project(booking: &Booking) -> (BookingStatus, Option<String>) {
    let fallback = if booking.has_driver() {
        BookingStatus::Assigned
    } else {
        BookingStatus::Searching
    };

    match parse_status(&booking.status) {
        ParsedStatus::Known(status) => (status, None),
        ParsedStatus::AwaitingDriver => (fallback, None),
        ParsedStatus::Unrecognized(raw) => (fallback, Some(raw)),
    }
}

/// What the UI shows for a tracked booking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingState {
    pub status: BookingStatus,
    /// Server status string from the last applied snapshot
    pub raw_status: Option<String>,
    pub driver: Option<Driver>,
    pub otp: Option<String>,
    /// Set while the server reports a status this client does not know
    pub unrecognized_status: Option<String>,
    /// Error from the most recent failed poll, cleared by the next success
    pub last_error: Option<String>,
    /// Number of successful polls
    pub polls: u64,
}

/// Effect of applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged(BookingStatus),
    Changed {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// The state was already terminal; the snapshot was dropped.
    Ignored(BookingStatus),
}

impl TrackingState {
    /// Apply a polled snapshot. No-op once terminal.
    pub fn apply(&mut self, booking: &Booking) -> Transition {
        if self.status.is_terminal() {
            return Transition::Ignored(self.status);
        }

        let (status, unrecognized) = project(booking);
        let from = self.status;

        self.status = status;
        self.raw_status = Some(booking.status.clone());
        self.driver = booking.driver.clone();
        self.otp = booking.otp.clone().filter(|otp| !otp.is_empty());
        self.unrecognized_status = unrecognized;
        self.last_error = None;
        self.polls += 1;

        if from == status {
            Transition::Unchanged(status)
        } else {
            Transition::Changed { from, to: status }
        }
    }

    /// Record a failed poll without touching the booking state.
    pub fn record_error(&mut self, error: &AppError) {
        self.last_error = Some(error.user_message());
    }

    /// Move to `Cancelled` after a successful cancel call.
    pub fn force_cancelled(&mut self) -> Transition {
        if self.status.is_terminal() {
            return Transition::Ignored(self.status);
        }
        let from = self.status;
        self.status = BookingStatus::Cancelled;
        self.last_error = None;
        Transition::Changed {
            from,
            to: BookingStatus::Cancelled,
        }
    }
}

/// Where the tracker reads bookings from and sends cancellations to.
pub trait BookingSource: Send + Sync + 'static {
    fn fetch_booking(
        &self,
        booking_id: &str,
    ) -> impl Future<Output = Result<Booking, AppError>> + Send;

    fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &CancelReason,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

impl BookingSource for BookingService {
    async fn fetch_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.get_booking(booking_id).await
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &CancelReason) -> Result<(), AppError> {
        BookingService::cancel_booking(self, booking_id, reason).await
    }
}

/// Shortest poll interval; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls one booking and publishes its `TrackingState`.
pub struct BookingTracker<S> {
    source: Arc<S>,
    booking_id: String,
    interval: Duration,
    state: watch::Sender<TrackingState>,
}

impl<S: BookingSource> BookingTracker<S> {
    pub fn new(source: Arc<S>, booking_id: impl Into<String>, interval: Duration) -> Self {
        let (state, _) = watch::channel(TrackingState::default());
        Self {
            source,
            booking_id: booking_id.into(),
            interval: interval.max(MIN_POLL_INTERVAL),
            state,
        }
    }

    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TrackingState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.subscribe()
    }

    /// Fetch the booking once and apply it.
    ///
    /// A failed fetch is recorded on the state and returned; the booking
    /// state itself is left alone.
    pub async fn poll_once(&self) -> Result<Transition, AppError> {
        let current = self.state.borrow().status;
        if current.is_terminal() {
            return Ok(Transition::Ignored(current));
        }

        let booking = match self.source.fetch_booking(&self.booking_id).await {
            Ok(booking) => booking,
            Err(e) => {
                tracing::warn!(booking_id = %self.booking_id, error = %e, "Booking poll failed");
                self.state.send_modify(|state| state.record_error(&e));
                return Err(e);
            }
        };

        let mut transition = Transition::Ignored(current);
        let mut newly_unrecognized = None;
        self.state.send_modify(|state| {
            let previous_unrecognized = state.unrecognized_status.clone();
            transition = state.apply(&booking);
            if state.unrecognized_status.is_some()
                && state.unrecognized_status != previous_unrecognized
            {
                newly_unrecognized = state.unrecognized_status.clone();
            }
        });

        if let Some(raw) = newly_unrecognized {
            tracing::warn!(
                booking_id = %self.booking_id,
                status = %raw,
                "Unrecognized booking status from server"
            );
        }
        if let Transition::Changed { from, to } = transition {
            tracing::info!(
                booking_id = %self.booking_id,
                from = %from,
                to = %to,
                "Booking status changed"
            );
        }

        Ok(transition)
    }

    /// Poll until the booking reaches a terminal state.
    ///
    /// Polls never overlap: a slow fetch delays the next tick.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            booking_id = %self.booking_id,
            interval_ms = self.interval.as_millis() as u64,
            "Tracking booking"
        );

        loop {
            ticker.tick().await;
            // Errors are already logged and recorded; try again next tick.
            let _ = self.poll_once().await;

            let status = self.state.borrow().status;
            if status.is_terminal() {
                tracing::info!(booking_id = %self.booking_id, status = %status, "Tracking finished");
                break;
            }
        }
    }

    /// Cancel the booking. On success the state becomes `Cancelled`
    /// regardless of what later polls report.
    pub async fn cancel(&self, reason: &CancelReason) -> Result<(), AppError> {
        let current = self.state.borrow().status;
        match current {
            BookingStatus::Cancelled => return Ok(()),
            BookingStatus::Completed => {
                return Err(AppError::BadRequest(
                    "This booking is already completed".to_string(),
                ))
            }
            _ => {}
        }

        self.source
            .cancel_booking(&self.booking_id, reason)
            .await?;

        self.state.send_modify(|state| {
            state.force_cancelled();
        });
        tracing::info!(booking_id = %self.booking_id, "Booking marked cancelled");
        Ok(())
    }

    /// Run the poll loop on a background task.
    pub fn spawn(self: &Arc<Self>) -> TrackerHandle {
        let tracker = Arc::clone(self);
        let state = tracker.subscribe();
        let task = tokio::spawn(async move { tracker.run().await });
        TrackerHandle { task, state }
    }
}

/// Background poll loop. Dropping the handle stops polling.
pub struct TrackerHandle {
    task: JoinHandle<()>,
    state: watch::Receiver<TrackingState>,
}

impl TrackerHandle {
    pub fn state(&self) -> watch::Receiver<TrackingState> {
        self.state.clone()
    }

    /// Stop polling now; an in-flight fetch is abandoned.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end and return the final state.
    pub async fn wait(&mut self) -> TrackingState {
        let _ = (&mut self.task).await;
        self.state.borrow().clone()
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
