// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the booking backend.

pub mod booking;
pub mod coins;
pub mod payment;
pub mod place;
pub mod user;

pub use booking::{
    Booking, BookingPayment, CancelBookingRequest, CancelReason, CreateBookingRequest, Driver,
    FareEstimate, FareEstimateRequest, Location, VehicleType,
};
pub use coins::{CoinBalance, CoinTransaction, CoinTransferRequest, CoinTransferResult};
pub use payment::{
    CreateOrderRequest, GatewayMessage, GatewaySuccess, PaymentMethod, PaymentOrder,
    PaymentReceipt, PaymentVerification,
};
pub use place::{LatLng, Place, Route};
pub use user::{AuthState, Credentials, LoginResponse, User};

use serde::{Deserialize, Serialize};

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "items", alias = "bookings", alias = "transactions")]
    pub data: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
}

impl<T> Page<T> {
    /// True if more items exist past this page.
    pub fn has_more(&self) -> bool {
        u64::from(self.page.max(1)) * u64::from(self.limit) < self.total
    }
}

/// Serde helpers for ids and codes that the backend sends either as
/// strings or as numbers.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn stringify<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!(
                "expected string or number, got {}",
                other
            ))),
        }
    }

    pub fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        stringify::<D::Error>(Value::deserialize(d)?)?
            .ok_or_else(|| serde::de::Error::custom("expected string or number, got null"))
    }

    pub fn opt_string_or_number<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        stringify::<D::Error>(Value::deserialize(d)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_more() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"items": [1, 2], "page": 1, "limit": 2, "total": 5}"#)
                .unwrap();
        assert!(page.has_more());

        let page: Page<u32> =
            serde_json::from_str(r#"{"data": [5], "page": 3, "limit": 2, "total": 5}"#).unwrap();
        assert!(!page.has_more());
    }
}
