// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride-booking command line client.
//!
//! Drives the same flows as the mobile app (log in, estimate, book, pay,
//! track, cancel) against the configured backend.

use clap::{Parser, Subcommand};
use ride_booking_client::{
    config::Config,
    error::AppError,
    models::{
        CancelReason, CreateBookingRequest, FareEstimateRequest, GatewayMessage, LatLng, Location,
        PaymentMethod,
    },
    services::{BookingStatus, BookingTracker},
    session::SessionEvent,
    AppState,
};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ride-booking", version, about = "Book and track deliveries and rides")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Text a login OTP to a phone number
    SendOtp { phone: String },
    /// Log in with the OTP
    Login { phone: String, otp: String },
    /// Show (and refresh) the stored profile
    Profile,
    Logout,
    /// List vehicle types
    Vehicles,
    /// Estimate a fare
    Fare {
        #[arg(long, value_parser = parse_lat_lng)]
        from: LatLng,
        #[arg(long, value_parser = parse_lat_lng)]
        to: LatLng,
        #[arg(long)]
        vehicle: String,
    },
    /// Create a booking
    Book {
        #[arg(long, value_parser = parse_lat_lng)]
        from: LatLng,
        #[arg(long, value_parser = parse_lat_lng)]
        to: LatLng,
        #[arg(long)]
        vehicle: String,
        /// Pay online instead of cash
        #[arg(long)]
        online: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your bookings
    Bookings {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Follow a booking until it completes or is cancelled
    Track { booking_id: String },
    /// Cancel a booking
    Cancel {
        booking_id: String,
        /// Free-text reason (defaults to "Changed my mind")
        #[arg(long)]
        reason: Option<String>,
    },
    /// Settle a booking in cash
    PayCash { booking_id: String },
    /// Create a gateway order for online payment
    PayOnline { booking_id: String, amount: f64 },
    /// Finish checkout with the JSON message posted by the gateway page
    Checkout { booking_id: String, message: String },
    /// Coin wallet
    Coins {
        #[command(subcommand)]
        command: CoinCommand,
    },
    /// Search places
    Search { query: String },
    /// Driving route between two points
    Route {
        #[arg(long, value_parser = parse_lat_lng)]
        from: LatLng,
        #[arg(long, value_parser = parse_lat_lng)]
        to: LatLng,
    },
}

#[derive(Subcommand)]
enum CoinCommand {
    Balance,
    History {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Transfer {
        phone: String,
        amount: f64,
        #[arg(long)]
        note: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let state = AppState::open(config).await?;

    // Surface forced logouts (refresh failures) to the user.
    let mut events = state.session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::LoggedOut { reason } = event {
                tracing::info!(reason = ?reason, "Logged out");
            }
        }
    });

    if let Err(e) = run(cli.command, &state).await {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, state: &AppState) -> Result<(), AppError> {
    match command {
        Command::SendOtp { phone } => {
            let sent = state.auth.send_otp(&phone).await?;
            println!("{}", sent.message.unwrap_or_else(|| "OTP sent".to_string()));
        }
        Command::Login { phone, otp } => {
            let user = state.auth.verify_otp(&phone, &otp).await?;
            println!("Logged in as {} ({})", user.name, user.phone);
        }
        Command::Profile => print_json(&state.auth.profile().await?)?,
        Command::Logout => {
            state.auth.logout().await?;
            println!("Logged out");
        }
        Command::Vehicles => print_json(&state.bookings.vehicle_types().await?)?,
        Command::Fare { from, to, vehicle } => {
            let request = FareEstimateRequest {
                pickup: to_location(from),
                drop: to_location(to),
                vehicle_type: vehicle,
            };
            print_json(&state.bookings.fare_estimate(&request).await?)?;
        }
        Command::Book {
            from,
            to,
            vehicle,
            online,
            notes,
        } => {
            let request = CreateBookingRequest {
                pickup: to_location(from),
                drop: to_location(to),
                vehicle_type: vehicle,
                payment_method: if online {
                    PaymentMethod::Online
                } else {
                    PaymentMethod::Cash
                },
                fare: None,
                notes,
            };
            print_json(&state.bookings.create_booking(&request).await?)?;
        }
        Command::Bookings { page, limit } => {
            print_json(&state.bookings.my_bookings(page, limit).await?)?
        }
        Command::Track { booking_id } => track(state, booking_id).await?,
        Command::Cancel { booking_id, reason } => {
            let reason = reason
                .map(CancelReason::Other)
                .unwrap_or(CancelReason::ChangedMind);
            let tracker = BookingTracker::new(
                state.bookings.clone(),
                booking_id,
                state.config.poll_interval,
            );
            tracker.cancel(&reason).await?;
            println!("Booking cancelled");
        }
        Command::PayCash { booking_id } => {
            print_json(&state.payments.confirm_cash(&booking_id).await?)?
        }
        Command::PayOnline { booking_id, amount } => {
            print_json(&state.payments.create_order(&booking_id, amount).await?)?
        }
        Command::Checkout {
            booking_id,
            message,
        } => {
            let message = GatewayMessage::parse(&message)?;
            let outcome = state
                .payments
                .complete_checkout(&booking_id, message)
                .await?;
            println!("{:?}", outcome);
        }
        Command::Coins { command } => match command {
            CoinCommand::Balance => print_json(&state.coins.balance().await?)?,
            CoinCommand::History { page, limit } => {
                print_json(&state.coins.history(page, limit).await?)?
            }
            CoinCommand::Transfer {
                phone,
                amount,
                note,
            } => print_json(
                &state
                    .coins
                    .transfer(&phone, amount, note.as_deref())
                    .await?,
            )?,
        },
        Command::Search { query } => print_json(&state.geocoding.search(&query, None).await?)?,
        Command::Route { from, to } => {
            let route = state.geocoding.route(from, to).await?;
            println!(
                "{:.1} km, {:.0} min, {} points",
                route.distance_km(),
                route.duration_secs / 60.0,
                route.geometry.0.len()
            );
        }
    }
    Ok(())
}

/// Print every state change until the booking finishes or Ctrl-C.
async fn track(state: &AppState, booking_id: String) -> Result<(), AppError> {
    let tracker = Arc::new(BookingTracker::new(
        state.bookings.clone(),
        booking_id,
        state.config.poll_interval,
    ));
    let mut handle = tracker.spawn();
    let mut updates = handle.state();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                if let Some(err) = &current.last_error {
                    println!("[{}] (poll failed: {})", current.status, err);
                    continue;
                }
                let driver = current.driver.as_ref().map(|d| d.name.as_str()).unwrap_or("-");
                let otp = current.otp.as_deref().unwrap_or("-");
                println!("[{}] driver: {} otp: {}", current.status, driver, otp);
                if current.status.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
                println!("Stopped tracking");
                return Ok(());
            }
        }
    }

    let final_state = handle.wait().await;
    if final_state.status == BookingStatus::Completed {
        println!("Delivered. Thanks for riding!");
    }
    Ok(())
}

fn to_location(position: LatLng) -> Location {
    Location {
        address: None,
        latitude: position.lat,
        longitude: position.lng,
    }
}

fn parse_lat_lng(raw: &str) -> Result<LatLng, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| "expected LAT,LNG".to_string())?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude: {}", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude: {}", lng))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err("coordinates out of range".to_string());
    }
    Ok(LatLng { lat, lng })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured logging on stderr (JSON unless `LOG_FORMAT=pretty`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ride_booking_client=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "pretty") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
