//! Booking, vehicle and fare models.

use serde::{Deserialize, Serialize};

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A pickup or drop point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

/// Driver details attached to an assigned booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Driver {
    #[serde(
        alias = "_id",
        default,
        deserialize_with = "super::de::opt_string_or_number"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub current_location: Option<Location>,
}

/// A payment recorded against a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPayment {
    #[serde(
        alias = "_id",
        default,
        deserialize_with = "super::de::opt_string_or_number"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Server-owned booking record, as returned by `GET /booking/{id}`.
///
/// `status` is the raw server string; see `services::tracking` for the
/// client-side projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(alias = "_id", deserialize_with = "super::de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub driver: Option<Driver>,
    #[serde(default, deserialize_with = "super::de::opt_string_or_number")]
    pub driver_id: Option<String>,
    #[serde(default, deserialize_with = "super::de::opt_string_or_number")]
    pub otp: Option<String>,
    #[serde(default, alias = "pickup_location")]
    pub pickup: Option<Location>,
    #[serde(default, alias = "drop_location")]
    pub drop: Option<Location>,
    #[serde(default, alias = "total_fare")]
    pub fare: Option<f64>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub payments: Vec<BookingPayment>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Booking {
    /// True if the server attached a driver in any form.
    pub fn has_driver(&self) -> bool {
        self.driver.is_some() || self.driver_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Vehicle category from `GET /vehicle/types`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct VehicleType {
    #[serde(alias = "_id", deserialize_with = "super::de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub base_fare: Option<f64>,
    #[serde(default)]
    pub per_km_rate: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of `POST /booking/fare-estimate`.
#[derive(Debug, Clone, Serialize)]
pub struct FareEstimateRequest {
    pub pickup: Location,
    pub drop: Location,
    pub vehicle_type: String,
}

/// Fare estimate computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct FareEstimate {
    #[serde(alias = "total_fare", alias = "fare")]
    pub total: f64,
    #[serde(default)]
    pub base_fare: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_min: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Body of `POST /booking/create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBookingRequest {
    pub pickup: Location,
    pub drop: Location,
    pub vehicle_type: String,
    pub payment_method: crate::models::PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /booking/{id}/cancel`.
#[derive(Debug, Clone, Serialize)]
pub struct CancelBookingRequest {
    pub reason: String,
}

/// Why the customer is cancelling. `Other` carries free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    DriverDelayed,
    ChangedMind,
    WrongAddress,
    BookedByMistake,
    FoundAlternative,
    Other(String),
}

impl CancelReason {
    /// The fixed choices offered before falling back to free text.
    pub const PRESETS: [CancelReason; 5] = [
        CancelReason::DriverDelayed,
        CancelReason::ChangedMind,
        CancelReason::WrongAddress,
        CancelReason::BookedByMistake,
        CancelReason::FoundAlternative,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CancelReason::DriverDelayed => "Driver is taking too long",
            CancelReason::ChangedMind => "Changed my mind",
            CancelReason::WrongAddress => "Wrong pickup or drop address",
            CancelReason::BookedByMistake => "Booked by mistake",
            CancelReason::FoundAlternative => "Found another option",
            CancelReason::Other(text) => text.as_str(),
        }
    }
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
